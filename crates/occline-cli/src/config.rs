//! Configuration loading from TOML files

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for occline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub harvest: HarvestSection,
    pub output: OutputSection,
    pub media: MediaSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestSection {
    pub family: String,
    /// Directory name of the partitioned output; defaults to the
    /// lowercased family name when unset
    pub dataset_name: Option<String>,
    pub base_url: String,
    pub page_size: u64,
    pub page_delay_ms: u64,
    pub max_records: usize,
}

impl Default for HarvestSection {
    fn default() -> Self {
        Self {
            family: "Cactaceae".to_string(),
            dataset_name: None,
            base_url: occline_gbif::GBIF_API_BASE.to_string(),
            page_size: 300,
            page_delay_ms: 500,
            max_records: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub root_dir: PathBuf,
    pub compression_level: i32,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./data"),
            compression_level: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MediaSection {
    pub sample_size: usize,
    pub per_record_cap: usize,
}

impl Default for MediaSection {
    fn default() -> Self {
        Self {
            sample_size: 100,
            per_record_cap: 3,
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./occline.toml (current directory)
    /// 2. ~/.config/occline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("occline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "occline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Output directory name for the partitioned record set
    pub fn dataset_name(&self) -> String {
        self.harvest
            .dataset_name
            .clone()
            .unwrap_or_else(|| self.harvest.family.to_lowercase())
    }
}
