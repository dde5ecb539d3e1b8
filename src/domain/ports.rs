use crate::domain::model::{ExplainSettings, ScreenSummary, VariantRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn vcf_path(&self) -> &str;
    fn drugs(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn explain_settings(&self) -> ExplainSettings;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<VariantRecord>>;
    async fn evaluate(&self, variants: Vec<VariantRecord>) -> Result<ScreenSummary>;
    async fn load(&self, summary: ScreenSummary) -> Result<String>;
}
