//! Configuration management command
//!
//! Provides CLI interface to view and edit system configuration.

use crate::system_config;
use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream::Stdout};
use sync_core::config::MAX_INTERVAL_MS;

/// Keys accepted by `get` and `set`
pub const KEYS: &[&str] = &[
    "sync.min_interval_ms",
    "sync.auto_sync_attachments",
    "session.kit",
    "session.controls",
];

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "System Configuration".if_supports_color(Stdout, |t| t.bold()));
    println!(
        "{}: {}\n",
        "Location".if_supports_color(Stdout, |t| t.dimmed()),
        config_path.display().if_supports_color(Stdout, |t| t.dimmed())
    );

    println!("{}", "[sync]".if_supports_color(Stdout, |t| t.yellow()));
    println!(
        "  {} = {} {}",
        "min_interval_ms".if_supports_color(Stdout, |t| t.cyan()),
        config.sync.min_interval_ms,
        format!("({:.1}s)", config.sync.min_interval_ms as f64 / 1000.0)
            .if_supports_color(Stdout, |t| t.dimmed())
    );
    println!(
        "  {} = {}",
        "auto_sync_attachments".if_supports_color(Stdout, |t| t.cyan()),
        config.sync.auto_sync_attachments
    );

    println!("\n{}", "[session]".if_supports_color(Stdout, |t| t.yellow()));
    println!(
        "  {} = {}",
        "kit".if_supports_color(Stdout, |t| t.cyan()),
        config
            .session
            .kit
            .as_deref()
            .map(str::to_string)
            .unwrap_or_else(|| "(all)".if_supports_color(Stdout, |t| t.dimmed()).to_string())
    );
    println!(
        "  {} = {}",
        "controls".if_supports_color(Stdout, |t| t.cyan()),
        config.session.controls
    );

    println!("\n{}", "Valid Ranges:".if_supports_color(Stdout, |t| t.bold()));
    println!("  min_interval_ms: 0-{}", MAX_INTERVAL_MS);
    println!("  controls: default, min, none");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;

    let value = match key {
        "sync.min_interval_ms" => config.sync.min_interval_ms.to_string(),
        "sync.auto_sync_attachments" => config.sync.auto_sync_attachments.to_string(),
        "session.kit" => config.session.kit.unwrap_or_default(),
        "session.controls" => config.session.controls,
        _ => anyhow::bail!(
            "Unknown config key: {}. Valid keys: {}",
            key,
            KEYS.join(", ")
        ),
    };

    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load()?;

    match key {
        "sync.min_interval_ms" => {
            let val: i64 = value.parse()
                .context("Invalid value: must be an integer number of milliseconds")?;
            config.sync.min_interval_ms = val;
        }
        "sync.auto_sync_attachments" => {
            let val: bool = value.parse()
                .context("Invalid value: must be 'true' or 'false'")?;
            config.sync.auto_sync_attachments = val;
        }
        "session.kit" => {
            config.session.kit = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        "session.controls" => {
            config.session.controls = value.to_string();
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Valid keys: {}",
            key,
            KEYS.join(", ")
        ),
    }

    // Validate before saving
    config.validate()
        .context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!(
        "{} {} = {}",
        "✓".if_supports_color(Stdout, |t| t.green()),
        key.if_supports_color(Stdout, |t| t.cyan()),
        value
    );
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!(
            "{} Created config file at: {}",
            "✓".if_supports_color(Stdout, |t| t.green()),
            config_path.display()
        );
    } else {
        println!("{}", config_path.display());
        if !config_path.exists() {
            let hint = "File does not exist. Use --create to create it.";
            println!("{}", hint.if_supports_color(Stdout, |t| t.yellow()));
        }
    }

    Ok(())
}

/// Print an annotated example config
pub async fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}
