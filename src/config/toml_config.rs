use crate::adapters::explain::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::config::VALID_OUTPUT_FORMATS;
use crate::core::ConfigProvider;
use crate::domain::model::ExplainSettings;
use crate::utils::error::{PgxError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub screening: ScreeningConfig,
    pub input: InputConfig,
    pub explanation: Option<ExplanationConfig>,
    pub report: ReportConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    pub name: String,
    pub description: Option<String>,
    pub drugs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub vcf: String,
    pub phenotype_table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationConfig {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PgxError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PgxError::InvalidConfigValueError {
            field: "toml_parsing".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        // 驗證藥物清單
        if self.screening.drugs.is_empty() {
            return Err(PgxError::MissingConfigError {
                field: "screening.drugs".to_string(),
            });
        }
        for drug in &self.screening.drugs {
            crate::utils::validation::validate_non_empty_string("screening.drugs", drug)?;
        }

        // 驗證 VCF 輸入
        crate::utils::validation::validate_path("input.vcf", &self.input.vcf)?;
        crate::utils::validation::validate_file_extensions(
            "input.vcf",
            std::slice::from_ref(&self.input.vcf),
            &["vcf"],
        )?;

        if let Some(table) = &self.input.phenotype_table {
            crate::utils::validation::validate_file_extensions(
                "input.phenotype_table",
                std::slice::from_ref(table),
                &["json"],
            )?;
        }

        // 驗證輸出路徑
        crate::utils::validation::validate_path("report.output_path", &self.report.output_path)?;

        // 驗證輸出格式
        for format in &self.report.output_formats {
            if !VALID_OUTPUT_FORMATS.contains(&format.as_str()) {
                return Err(PgxError::InvalidConfigValueError {
                    field: "report.output_formats".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        VALID_OUTPUT_FORMATS.join(", ")
                    ),
                });
            }
        }

        // 驗證解釋服務設定
        if let Some(explanation) = &self.explanation {
            if let Some(endpoint) = &explanation.endpoint {
                crate::utils::validation::validate_url("explanation.endpoint", endpoint)?;
            }
            if let Some(timeout) = explanation.timeout_seconds {
                crate::utils::validation::validate_range(
                    "explanation.timeout_seconds",
                    timeout,
                    1,
                    300,
                )?;
            }
        }

        Ok(())
    }

    /// 取得表型表覆蓋檔路徑
    pub fn phenotype_table(&self) -> Option<&str> {
        self.input.phenotype_table.as_deref()
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn vcf_path(&self) -> &str {
        &self.input.vcf
    }

    fn drugs(&self) -> &[String] {
        &self.screening.drugs
    }

    fn output_path(&self) -> &str {
        &self.report.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.report.output_formats
    }

    fn explain_settings(&self) -> ExplainSettings {
        let explanation = self.explanation.as_ref();
        ExplainSettings {
            enabled: explanation.and_then(|e| e.enabled).unwrap_or(true),
            endpoint: explanation
                .and_then(|e| e.endpoint.clone())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: explanation
                .and_then(|e| e.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            // 未替換成功的 ${VAR} 不當作金鑰
            api_key: explanation
                .and_then(|e| e.api_key.clone())
                .filter(|key| !key.starts_with("${"))
                .or_else(|| std::env::var("OPENAI_API_KEY").ok()),
            timeout_secs: explanation
                .and_then(|e| e.timeout_seconds)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
