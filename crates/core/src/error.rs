//! Error types for registry and scheduler configuration

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or constructing a scheduler
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configured minimum interval is below zero
    #[error("minimum sync interval must not be negative (got {0} ms)")]
    NegativeInterval(i64),

    /// The configured minimum interval exceeds the supported range
    #[error("minimum sync interval of {got} ms exceeds the maximum of {max} ms")]
    IntervalTooLarge { got: i64, max: i64 },

    /// No tokio runtime is available to drive the default timer
    #[error("no tokio runtime available for the scheduler timer")]
    NoRuntime,

    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
