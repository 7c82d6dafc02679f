//! Node errors

use std::time::Duration;

use thiserror::Error;

use leveler_core::LevelerError;

/// Leveling node errors
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Controller setup failed: {0}")]
    Core(#[from] LevelerError),
    #[error("Parameter {path} not available after {waited:?}")]
    ParameterTimeout { path: String, waited: Duration },
    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),
}
