#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use pgx_guard::config::lambda::{LambdaConfig, S3Storage};
#[cfg(feature = "lambda")]
use pgx_guard::core::{Pipeline, Storage};
#[cfg(feature = "lambda")]
use pgx_guard::domain::model::RiskLevel;
#[cfg(feature = "lambda")]
use pgx_guard::domain::rules::{PhenotypeTable, RiskResolver};
#[cfg(feature = "lambda")]
use pgx_guard::utils::validation::Validate;
#[cfg(feature = "lambda")]
use pgx_guard::ScreenPipeline;
#[cfg(feature = "lambda")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "lambda")]
#[derive(Deserialize)]
pub struct Request {
    pub vcf_key: Option<String>,
    pub drugs: Option<Vec<String>>,
    pub s3_bucket: Option<String>,
    pub output_prefix: Option<String>,
}

#[cfg(feature = "lambda")]
#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub output_path: String,
    pub variants_found: usize,
    pub drugs_screened: usize,
    pub highest_risk: Option<String>,
}

#[cfg(feature = "lambda")]
fn boxed(e: pgx_guard::PgxError) -> Error {
    Box::new(e) as Box<dyn std::error::Error + Send + Sync>
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    tracing::info!("Starting screening Lambda function");

    // 設置環境變量 (如果事件中有的話)
    if let Some(vcf_key) = &event.payload.vcf_key {
        std::env::set_var("VCF_KEY", vcf_key);
    }
    if let Some(drugs) = &event.payload.drugs {
        std::env::set_var("DRUGS", drugs.join(","));
    }
    if let Some(bucket) = &event.payload.s3_bucket {
        std::env::set_var("S3_BUCKET", bucket);
    }
    if let Some(prefix) = &event.payload.output_prefix {
        std::env::set_var("OUTPUT_PREFIX", prefix);
    }

    // 創建Lambda配置並驗證
    let lambda_config = LambdaConfig::from_env().map_err(boxed)?;
    lambda_config.validate().map_err(boxed)?;

    // 創建AWS配置和S3客戶端
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let region = Region::new(lambda_config.s3_region.clone());
    let config = aws_sdk_s3::config::Builder::from(&config)
        .region(region)
        .force_path_style(true)
        .build();
    let s3_client = S3Client::from_conf(config);

    // 創建存儲
    let storage = S3Storage::with_prefix(
        s3_client,
        lambda_config.s3_bucket.clone(),
        lambda_config.output_prefix.clone(),
    );

    // 載入表型對照表
    let phenotypes = match &lambda_config.phenotype_table_key {
        Some(key) => {
            let bytes = storage.read_file(key).await.map_err(boxed)?;
            let text = String::from_utf8_lossy(&bytes);
            PhenotypeTable::from_json_str(&text).map_err(boxed)?
        }
        None => PhenotypeTable::builtin(),
    };

    // 創建管道並逐階段執行，保留摘要供回應使用
    let resolver = RiskResolver::with_builtin_rules(phenotypes);
    let pipeline = ScreenPipeline::new(storage, lambda_config, resolver);

    let variants = pipeline.extract().await.map_err(boxed)?;
    let variants_found = variants.len();

    let summary = pipeline.evaluate(variants).await.map_err(boxed)?;
    let drugs_screened = summary.screens.len();
    let highest_risk = summary.highest_risk().map(|risk| {
        match risk {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
        .to_string()
    });

    let output_path = pipeline.load(summary).await.map_err(boxed)?;

    let response = Response {
        message: "Screening completed successfully".to_string(),
        output_path,
        variants_found,
        drugs_screened,
        highest_risk,
    };

    tracing::info!("Screening Lambda function completed successfully");
    Ok(response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    pgx_guard::utils::logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
