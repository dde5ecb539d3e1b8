use thiserror::Error;

#[derive(Error, Debug)]
pub enum PgxError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Configuration,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PgxError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        PgxError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PgxError::InvalidInput { .. } => ErrorCategory::Input,
            PgxError::ApiError(_) => ErrorCategory::Network,
            PgxError::ConfigError { .. }
            | PgxError::MissingConfigError { .. }
            | PgxError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            PgxError::ZipError(_)
            | PgxError::CsvError(_)
            | PgxError::SerializationError(_)
            | PgxError::ProcessingError { .. } => ErrorCategory::Processing,
            PgxError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路錯誤通常可以重試
            PgxError::ApiError(_) => ErrorSeverity::Medium,
            PgxError::InvalidInput { .. }
            | PgxError::ConfigError { .. }
            | PgxError::MissingConfigError { .. }
            | PgxError::InvalidConfigValueError { .. }
            | PgxError::ZipError(_)
            | PgxError::CsvError(_)
            | PgxError::SerializationError(_)
            | PgxError::ProcessingError { .. } => ErrorSeverity::High,
            PgxError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PgxError::InvalidInput { message } => {
                format!("The variant file could not be read: {}", message)
            }
            PgxError::ApiError(_) => {
                "The explanation service could not be reached. The report was generated with template text.".to_string()
            }
            PgxError::ConfigError { message } => format!("Configuration problem: {}", message),
            PgxError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            PgxError::InvalidConfigValueError { field, value, reason } => {
                format!("Setting '{}' has invalid value '{}': {}", field, value, reason)
            }
            PgxError::ZipError(_) => "The report archive could not be written".to_string(),
            PgxError::CsvError(_) => "The variant sheet could not be written".to_string(),
            PgxError::IoError(e) => format!("File system error: {}", e),
            PgxError::SerializationError(_) => "The report could not be serialized".to_string(),
            PgxError::ProcessingError { message } => format!("Processing failed: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PgxError::InvalidInput { .. } => {
                "Check that the input is a plain-text VCF file with a valid header".to_string()
            }
            PgxError::ApiError(_) => {
                "Check the explanation endpoint URL and API key, or rerun with --no-explain".to_string()
            }
            PgxError::ConfigError { .. }
            | PgxError::MissingConfigError { .. }
            | PgxError::InvalidConfigValueError { .. } => {
                "Review the configuration values and consult --help for accepted settings".to_string()
            }
            PgxError::ZipError(_) | PgxError::CsvError(_) | PgxError::SerializationError(_) => {
                "Rerun the screening; if the problem persists the output data may be inconsistent".to_string()
            }
            PgxError::IoError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            PgxError::ProcessingError { .. } => {
                "Rerun with --verbose to see which stage failed".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PgxError>;
