pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use config::toml_config::TomlConfig;
pub use crate::core::{engine::ScreenEngine, pipeline::ScreenPipeline};
pub use domain::rules::{PhenotypeTable, RiskResolver, RuleSet};
pub use utils::error::{PgxError, Result};
