//! Configuration structures for the bid-tabulation engine.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bid file parsing configuration.
    pub parser: ParserConfig,
    /// Listing (filter/sort) configuration.
    pub view: ViewConfig,
    /// Snapshot export configuration.
    pub export: ExportConfig,
}

impl Config {
    /// Parse a configuration from JSON text. Missing sections take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.parser.file_extension.trim().is_empty() {
            return Err(Error::config("parser.file_extension must not be empty"));
        }
        if self.parser.century_base < 0 || self.parser.century_base % 100 != 0 {
            return Err(Error::config(format!(
                "parser.century_base must be a non-negative multiple of 100, got {}",
                self.parser.century_base
            )));
        }
        if self.export.filename_prefix.trim().is_empty() {
            return Err(Error::config("export.filename_prefix must not be empty"));
        }
        Ok(())
    }
}

/// Bid file parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Extension (without dot) of files picked up from a directory.
    /// Compared case-sensitively.
    pub file_extension: String,
    /// Century added to two-digit years (`DATE 03/15/24` -> 2024).
    pub century_base: i32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            file_extension: "TXT".to_string(),
            century_base: 2000,
        }
    }
}

/// Listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Default sort key name (`date`, `county`, `projectType`, ...).
    pub sort_key: String,
    /// Sort descending by default.
    pub descending: bool,
    /// Number of bidders shown in ranking tables.
    pub top_bidders: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            sort_key: "date".to_string(),
            descending: true,
            top_bidders: 10,
        }
    }
}

/// Snapshot export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Prefix of generated snapshot file names.
    pub filename_prefix: String,
    /// Pretty-print snapshot JSON.
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename_prefix: "txbids-export".to_string(),
            pretty: true,
        }
    }
}
