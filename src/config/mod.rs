pub mod cli;
pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::adapters::explain::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::ExplainSettings;
#[cfg(feature = "cli")]
use crate::utils::error::{PgxError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const VALID_OUTPUT_FORMATS: [&str; 3] = ["json", "text", "csv"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "pgx-guard")]
#[command(about = "Pharmacogenomic drug-risk screening from annotated VCF files")]
pub struct CliConfig {
    /// Patient VCF file with GENE/STAR annotated variants
    #[arg(long)]
    pub vcf: String,

    /// Drug(s) to screen, repeatable or comma-separated
    #[arg(long = "drug", value_delimiter = ',', required = true)]
    pub drugs: Vec<String>,

    /// JSON file overriding the built-in phenotype table
    #[arg(long)]
    pub phenotypes: Option<String>,

    #[arg(long, default_value = "./reports")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "json,text,csv")]
    pub output_formats: Vec<String>,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub explain_endpoint: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub explain_model: String,

    /// Falls back to the OPENAI_API_KEY environment variable
    #[arg(long)]
    pub explain_api_key: Option<String>,

    #[arg(long, default_value = "10")]
    pub explain_timeout_secs: u64,

    #[arg(long, help = "Skip the explanation API and use template text")]
    pub no_explain: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system resource monitoring")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        // 驗證 VCF 輸入
        validation::validate_path("vcf", &self.vcf)?;
        validation::validate_file_extensions("vcf", std::slice::from_ref(&self.vcf), &["vcf"])?;

        // 驗證藥物清單
        for drug in &self.drugs {
            validation::validate_non_empty_string("drug", drug)?;
        }

        // 驗證表型表覆蓋檔
        if let Some(phenotypes) = &self.phenotypes {
            validation::validate_path("phenotypes", phenotypes)?;
            validation::validate_file_extensions(
                "phenotypes",
                std::slice::from_ref(phenotypes),
                &["json"],
            )?;
        }

        // 驗證輸出路徑與格式
        validation::validate_path("output_path", &self.output_path)?;
        for format in &self.output_formats {
            if !VALID_OUTPUT_FORMATS.contains(&format.as_str()) {
                return Err(PgxError::InvalidConfigValueError {
                    field: "output_formats".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        VALID_OUTPUT_FORMATS.join(", ")
                    ),
                });
            }
        }

        // 驗證解釋服務設定
        validation::validate_url("explain_endpoint", &self.explain_endpoint)?;
        validation::validate_non_empty_string("explain_model", &self.explain_model)?;
        validation::validate_range("explain_timeout_secs", self.explain_timeout_secs, 1, 300)?;

        Ok(())
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn vcf_path(&self) -> &str {
        &self.vcf
    }

    fn drugs(&self) -> &[String] {
        &self.drugs
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }

    fn explain_settings(&self) -> ExplainSettings {
        ExplainSettings {
            enabled: !self.no_explain,
            endpoint: self.explain_endpoint.clone(),
            model: self.explain_model.clone(),
            api_key: self
                .explain_api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok()),
            timeout_secs: self.explain_timeout_secs,
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_separated_drugs() {
        let config = CliConfig::try_parse_from([
            "pgx-guard",
            "--vcf",
            "patient.vcf",
            "--drug",
            "Codeine,Warfarin",
            "--drug",
            "Simvastatin",
        ])
        .unwrap();

        assert_eq!(config.drugs, vec!["Codeine", "Warfarin", "Simvastatin"]);
        assert_eq!(config.output_path, "./reports");
        assert_eq!(config.output_formats, vec!["json", "text", "csv"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_drug_argument_is_required() {
        let result = CliConfig::try_parse_from(["pgx-guard", "--vcf", "patient.vcf"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_output_format() {
        let config = CliConfig::try_parse_from([
            "pgx-guard",
            "--vcf",
            "patient.vcf",
            "--drug",
            "Codeine",
            "--output-formats",
            "json,xml",
        ])
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_vcf_input() {
        let config = CliConfig::try_parse_from([
            "pgx-guard",
            "--vcf",
            "patient.csv",
            "--drug",
            "Codeine",
        ])
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_explain_disables_collaborator() {
        let config = CliConfig::try_parse_from([
            "pgx-guard",
            "--vcf",
            "patient.vcf",
            "--drug",
            "Codeine",
            "--no-explain",
        ])
        .unwrap();

        let settings = config.explain_settings();
        assert!(!settings.enabled);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.timeout_secs, 10);
    }
}
