//! Scheduler configuration
//!
//! Loaded from the `[sync]` table of a TOML file. The interval is kept as a
//! signed millisecond count so that a negative value in a config file is
//! reported instead of silently wrapping or clamping.

use crate::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound on the minimum interval (1 hour)
pub const MAX_INTERVAL_MS: i64 = 60 * 60 * 1000;

/// Default minimum interval between sync batches (5 seconds)
pub const DEFAULT_INTERVAL_MS: i64 = 5000;

/// Join scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum milliseconds between sync batches (default: 5000)
    pub min_interval_ms: i64,
    /// Register the attachment resync action on startup (default: true)
    pub auto_sync_attachments: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_INTERVAL_MS,
            auto_sync_attachments: true,
        }
    }
}

impl SyncConfig {
    /// Config with the given interval and defaults otherwise
    pub fn with_interval_ms(min_interval_ms: i64) -> Self {
        Self {
            min_interval_ms,
            ..Self::default()
        }
    }

    /// Parse a config from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SyncError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.min_interval_ms < 0 {
            return Err(SyncError::NegativeInterval(self.min_interval_ms));
        }
        if self.min_interval_ms > MAX_INTERVAL_MS {
            return Err(SyncError::IntervalTooLarge {
                got: self.min_interval_ms,
                max: MAX_INTERVAL_MS,
            });
        }
        Ok(())
    }

    /// The validated minimum interval
    pub fn min_interval(&self) -> Result<Duration> {
        self.validate()?;
        Ok(Duration::from_millis(self.min_interval_ms as u64))
    }
}
