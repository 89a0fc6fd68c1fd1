//! Application configuration
//!
//! Loaded from a TOML file; every section and field has a default so an
//! empty or missing file yields a working configuration.
//!
//! ```toml
//! [archive]
//! journal_path = "data/archive.bin"
//!
//! [display]
//! quality_filter_threshold = "B"
//! time_filter_enabled = true
//! time_filter_window_hours = 48.0
//!
//! [logging]
//! level = "debug"
//! json = false
//!
//! [[regions]]
//! name = "Honshu, Japan"
//! latitude = 36.2
//! longitude = 138.3
//! ```

use crate::error::{Error, Result};
use crate::geo::{default_anchors, AttenuationEstimator, RegionAnchor};
use crate::query::DisplayConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub archive: ArchiveSettings,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
    pub intensity: AttenuationEstimator,
    pub regions: Vec<RegionAnchor>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            archive: ArchiveSettings::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
            intensity: AttenuationEstimator::default(),
            regions: default_anchors(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            return Err(Error::Configuration(
                "at least one region anchor is required".to_string(),
            ));
        }
        self.display.validate()
    }
}

/// Archive storage settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    pub journal_path: PathBuf,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            journal_path: PathBuf::from("archive.bin"),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Also write a daily-rotated log file into this directory
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}
