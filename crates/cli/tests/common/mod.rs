//! Common utilities for integration tests

pub mod cli;

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Hat catalog used by the catalog and try-on tests
pub const TEST_CATALOG: &str = r#"{
    "options": { "previewMargin": 2.0 },
    "viking": {
        "resourceId": "artifact:111",
        "scale": { "x": 1.0, "y": 1.0, "z": 1.0 }
    },
    "samurai": {
        "resourceId": "artifact:222"
    }
}"#;

/// Scratch directory holding a config file and catalog
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// Write the test catalog and return its path
    pub fn write_catalog(&self) -> PathBuf {
        let path = self.dir.path().join("hats.json");
        std::fs::write(&path, TEST_CATALOG).expect("Failed to write catalog");
        path
    }
}
