use crate::adapters::explain::ExplanationClient;
use crate::adapters::report::{self, BUNDLE_NAME};
use crate::adapters::vcf::VcfSource;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::extract::extract_variants;
use crate::domain::model::{DrugScreen, ScreenSummary, VariantRecord};
use crate::domain::rules::RiskResolver;
use crate::utils::error::Result;

pub struct ScreenPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    resolver: RiskResolver,
    explainer: ExplanationClient,
}

impl<S: Storage, C: ConfigProvider> ScreenPipeline<S, C> {
    pub fn new(storage: S, config: C, resolver: RiskResolver) -> Self {
        let explainer = ExplanationClient::new(config.explain_settings());
        Self {
            storage,
            config,
            resolver,
            explainer,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ScreenPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<VariantRecord>> {
        // 從存儲讀取VCF，解碼後只保留藥物基因相關的變異
        tracing::debug!("Reading VCF file: {}", self.config.vcf_path());
        let bytes = self.storage.read_file(self.config.vcf_path()).await?;

        let source = VcfSource::from_bytes(bytes)?;
        let variants = extract_variants(source.entries());

        tracing::info!("🧬 Found {} pharmacogene variant(s)", variants.len());
        Ok(variants)
    }

    async fn evaluate(&self, variants: Vec<VariantRecord>) -> Result<ScreenSummary> {
        let mut screens = Vec::new();

        for drug in self.config.drugs() {
            let result = self.resolver.evaluate(drug, &variants);
            tracing::debug!(
                "{}: {} (confidence: {:.2})",
                drug,
                result.recommendation,
                result.confidence
            );

            // 只在解析到基因時請求解釋文字
            let explanation = match result.gene.as_deref() {
                Some(gene) => Some(
                    self.explainer
                        .generate(drug, gene, result.phenotype.as_deref())
                        .await,
                ),
                None => None,
            };

            screens.push(DrugScreen::new(drug.clone(), result, explanation));
        }

        Ok(ScreenSummary::new(screens, variants))
    }

    async fn load(&self, summary: ScreenSummary) -> Result<String> {
        let output_path = format!("{}/{}", self.config.output_path(), BUNDLE_NAME);

        let bundle = report::build_bundle(&summary, self.config.output_formats())?;

        // 保存報告包
        tracing::debug!("Writing report bundle ({} bytes) to storage", bundle.len());
        self.storage.write_file(BUNDLE_NAME, &bundle).await?;

        tracing::debug!("Report bundle saved successfully");
        Ok(output_path)
    }
}
