//! Configuration handling for the repdb CLI
//!
//! Supports loading configuration from repdb.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use repdb_core::{
    AlleleIndexing, BuildParams, ExactMerge, IndexWidth, LevenshteinMerge, MergePolicy,
    StoreOptions, DEFAULT_DISTANCE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CliError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Minimum repeat length in bases
    #[serde(default = "default_min_repeat_len")]
    pub min_repeat_len: u64,

    /// Minimum number of occurrences
    #[serde(default = "default_min_repeat_count")]
    pub min_repeat_count: usize,

    /// Merge near-identical repeat groups
    #[serde(default)]
    pub grouping: bool,

    /// Edit distance tolerated when merging
    #[serde(default = "default_max_edit")]
    pub max_edit: usize,

    /// Merge policy ("levenshtein" or "exact")
    #[serde(default = "default_merge_policy")]
    pub merge_policy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Integer width of the database file ("u32" or "u64")
    #[serde(default)]
    pub index_width: IndexWidth,

    /// Write and read big-endian files
    #[serde(default)]
    pub big_endian: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum joined-offset distance between paired occurrences
    #[serde(default = "default_distance")]
    pub distance: u64,

    /// Allele pairing mode ("independent" or "legacy-outer-index")
    #[serde(default)]
    pub allele_indexing: AlleleIndexing,
}

// Default value functions
fn default_min_repeat_len() -> u64 { 100 }
fn default_min_repeat_count() -> usize { 5 }
fn default_max_edit() -> usize { 10 }
fn default_merge_policy() -> String { "levenshtein".to_string() }
fn default_distance() -> u64 { DEFAULT_DISTANCE }

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            min_repeat_len: default_min_repeat_len(),
            min_repeat_count: default_min_repeat_count(),
            grouping: false,
            max_edit: default_max_edit(),
            merge_policy: default_merge_policy(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            index_width: IndexWidth::U32,
            big_endian: false,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            distance: default_distance(),
            allele_indexing: AlleleIndexing::Independent,
        }
    }
}

impl BuildConfig {
    pub fn params(&self) -> BuildParams {
        BuildParams {
            min_repeat_len: self.min_repeat_len,
            min_repeat_count: self.min_repeat_count,
            grouping: self.grouping,
            max_edit: self.max_edit,
        }
    }

    pub fn merge_policy(&self) -> Result<Box<dyn MergePolicy>, CliError> {
        match self.merge_policy.as_str() {
            "levenshtein" => Ok(Box::new(LevenshteinMerge)),
            "exact" => Ok(Box::new(ExactMerge)),
            other => Err(CliError::config(format!(
                "unknown merge policy '{}', expected 'levenshtein' or 'exact'",
                other
            ))),
        }
    }
}

impl StoreConfig {
    pub fn options(&self) -> StoreOptions {
        StoreOptions::new(self.index_width, self.big_endian)
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                // Try to find repdb.toml in current directory
                let default_path = PathBuf::from("repdb.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: repdb.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to serialize default configuration")
    }
}
