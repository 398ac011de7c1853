pub mod app_config;
pub mod config;
pub mod records;
pub mod selectors;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, OutputFormat, WarehouseNamespace};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use records::{ListingDetail, ListingReference, NormalizedRecord, ResultSet};
pub use selectors::{load_selectors, SiteSelectors};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read selectors file {path}: {source}")]
    SelectorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selectors file: {0}")]
    SelectorsFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
