//! System configuration file
//!
//! Stored at `<config dir>/syncfix/config.toml`. The `SYNCFIX_CONFIG`
//! environment variable points at a different file. A missing file means
//! defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use session::Controls;
use std::path::PathBuf;
use sync_core::SyncConfig;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "SYNCFIX_CONFIG";

/// Full system configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Join scheduler settings
    pub sync: SyncConfig,
    /// Hat session settings
    pub session: SessionSettings,
}

/// Hat session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Hat kit to load when no catalog path is given
    pub kit: Option<String>,
    /// Control set merged into the catalog: default, min or none
    pub controls: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            kit: None,
            controls: "default".to_string(),
        }
    }
}

impl SystemConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.sync.validate()?;
        match self.session.controls.as_str() {
            "default" | "min" | "none" => {}
            other => anyhow::bail!(
                "session.controls must be one of default, min, none (got '{}')",
                other
            ),
        }
        Ok(())
    }

    /// Parsed control set
    pub fn controls(&self) -> Controls {
        Controls::parse(&self.session.controls)
    }
}

/// Location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("syncfix").join("config.toml"))
}

/// Load the config, falling back to defaults when the file is missing
pub fn load() -> Result<SystemConfig> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Write the config file, creating its directory
pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Create the config file with defaults if it does not exist
pub fn init_if_missing() -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        save(&SystemConfig::default())?;
    }
    Ok(())
}

/// Annotated example config
pub fn example_config() -> &'static str {
    r#"# Syncfix configuration

[sync]
# Minimum milliseconds between a window's first join and its sync batch (0-3600000)
min_interval_ms = 5000
# Detach and reattach attached objects after users join
auto_sync_attachments = true

[session]
# Hat kit loaded when no catalog path is given (e.g. "viking_helmets")
# kit = "city_helmets"
# Control entries merged into the hat menu: default, min or none
controls = "default"
"#
}
