#[cfg(feature = "lambda")]
use crate::adapters::explain::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
#[cfg(feature = "lambda")]
use crate::core::{ConfigProvider, Storage};
#[cfg(feature = "lambda")]
use crate::domain::model::ExplainSettings;
#[cfg(feature = "lambda")]
use crate::utils::error::{PgxError, Result};
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use std::env;

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub s3_bucket: String,
    pub s3_region: String,
    pub vcf_key: String,
    pub drugs: Vec<String>,
    pub phenotype_table_key: Option<String>,
    pub output_prefix: String,
    pub output_formats: Vec<String>,
    pub explain_enabled: bool,
    pub explain_endpoint: String,
    pub explain_model: String,
    pub explain_api_key: Option<String>,
    pub explain_timeout_secs: u64,
}

#[cfg(feature = "lambda")]
impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            s3_bucket: env::var("S3_BUCKET").map_err(|_| PgxError::ConfigError {
                message: "S3_BUCKET environment variable is required".to_string(),
            })?,
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "ap-southeast-2".to_string()),
            vcf_key: env::var("VCF_KEY").map_err(|_| PgxError::ConfigError {
                message: "VCF_KEY environment variable is required".to_string(),
            })?,
            drugs: split_list(&env::var("DRUGS").unwrap_or_default()),
            phenotype_table_key: env::var("PHENOTYPE_TABLE_KEY").ok(),
            output_prefix: env::var("OUTPUT_PREFIX").unwrap_or_else(|_| "pgx-reports".to_string()),
            output_formats: {
                let formats = env::var("OUTPUT_FORMATS").unwrap_or_else(|_| "json,text,csv".to_string());
                split_list(&formats)
            },
            explain_enabled: env::var("EXPLAIN_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            explain_endpoint: env::var("EXPLAIN_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            explain_model: env::var("EXPLAIN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            explain_api_key: env::var("OPENAI_API_KEY").ok(),
            explain_timeout_secs: env::var("EXPLAIN_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }
}

#[cfg(feature = "lambda")]
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(feature = "lambda")]
impl ConfigProvider for LambdaConfig {
    fn vcf_path(&self) -> &str {
        &self.vcf_key
    }

    fn drugs(&self) -> &[String] {
        &self.drugs
    }

    fn output_path(&self) -> &str {
        &self.output_prefix
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }

    fn explain_settings(&self) -> ExplainSettings {
        ExplainSettings {
            enabled: self.explain_enabled,
            endpoint: self.explain_endpoint.clone(),
            model: self.explain_model.clone(),
            api_key: self.explain_api_key.clone(),
            timeout_secs: self.explain_timeout_secs,
        }
    }
}

#[cfg(feature = "lambda")]
impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        // 驗證S3 bucket名稱與區域
        validate_s3_bucket_name("s3_bucket", &self.s3_bucket)?;
        validate_aws_region("s3_region", &self.s3_region)?;

        // 驗證輸入輸出鍵
        validate_non_empty_string("vcf_key", &self.vcf_key)?;
        validate_non_empty_string("output_prefix", &self.output_prefix)?;

        // 驗證藥物清單
        if self.drugs.is_empty() {
            return Err(PgxError::MissingConfigError {
                field: "DRUGS".to_string(),
            });
        }

        // 驗證解釋服務設定
        validate_url("explain_endpoint", &self.explain_endpoint)?;
        validate_range("explain_timeout_secs", self.explain_timeout_secs, 1, 300)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(feature = "lambda")]
fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(PgxError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name must be between 3 and 63 characters".to_string(),
        });
    }

    let valid_chars = bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if !valid_chars || bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(PgxError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots, and cannot start or end with a hyphen"
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(feature = "lambda")]
fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    crate::utils::validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(PgxError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    prefix: String,
}

#[cfg(feature = "lambda")]
impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self {
            client,
            bucket,
            prefix: String::new(),
        }
    }

    pub fn with_prefix(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    fn object_key(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), path)
        }
    }
}

#[cfg(feature = "lambda")]
impl Storage for S3Storage {
    // 讀取用呼叫端給的完整物件鍵（如 VCF_KEY），寫入才掛上 prefix
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| PgxError::ProcessingError {
                message: format!("Failed to read s3://{}/{}: {}", self.bucket, path, e),
            })?;

        let data = resp.body.collect().await.map_err(|e| PgxError::ProcessingError {
            message: format!("Failed to collect S3 object body: {}", e),
        })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let key = self.object_key(path);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| PgxError::ProcessingError {
                message: format!("Failed to write s3://{}/{}: {}", self.bucket, key, e),
            })?;

        tracing::debug!("Wrote {} bytes to s3://{}/{}", data.len(), self.bucket, key);
        Ok(())
    }
}
