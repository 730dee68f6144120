//! # Configuration Module
//!
//! This module handles configuration management and data directory setup for Bairry.
//! It provides platform-appropriate storage locations and the tunable parameters of
//! the clustering and scoring core.
//!
//! ## Data Storage
//!
//! Bairry keeps its profile snapshot in the platform-standard data directory:
//! - Linux: `~/.local/share/bairry/`
//! - macOS: `~/Library/Application Support/bairry/`
//! - Windows: `%APPDATA%\bairry\`
//!
//! The optional `config.json` lives in the platform config directory
//! (`~/.config/bairry/` on Linux). A missing config file means defaults.

use crate::error::TasteError;
use crate::pipeline::ScoringWeights;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Parameters of the per-listener clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// One extra cluster per this many embedded songs.
    pub songs_per_cluster: usize,
    /// Upper bound on clusters per listener, whatever the library size.
    pub max_clusters: usize,
    /// Iteration ceiling for the relocation loop.
    pub max_iterations: usize,
    /// Seed for the initial centroid sampling.
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            songs_per_cluster: 50,
            max_clusters: 5,
            max_iterations: 100,
            seed: 42,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        let checks = [
            ("cluster.songs_per_cluster", self.songs_per_cluster),
            ("cluster.max_clusters", self.max_clusters),
            ("cluster.max_iterations", self.max_iterations),
        ];

        match checks.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(TasteError::InvalidConfig(format!("{name} must be at least 1"))),
            None => Ok(()),
        }
    }
}

/// Everything tunable, as read from `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub scoring: ScoringWeights,
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A file that does not exist yields [`Config::default`]. A file that exists
    /// but does not parse, or holds values that fail [`Config::validate`], is an
    /// error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bairry::config::{get_config_path, Config};
    ///
    /// let config = Config::load(&get_config_path()?)?;
    /// println!("max clusters: {}", config.cluster.max_clusters);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Config file {} is not valid JSON", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Config file {} has invalid values", path.display()))?;

        debug!("Loaded config from {}: {config:?}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.cluster.validate()?;
        self.scoring.validate()
    }
}

/// Returns the platform-appropriate data directory for Bairry, creating it if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The bairry subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!(
            "Could not determine system data directory. \
             Please ensure your platform supports standard data directories."
        ))?;

    let bairry_dir = data_dir.join("bairry");
    fs::create_dir_all(&bairry_dir)
        .with_context(|| format!(
            "Failed to create Bairry data directory at {}. Please check file permissions.",
            bairry_dir.display()
        ))?;

    Ok(bairry_dir)
}

/// Returns the path of the profile snapshot file (`profiles.json`).
pub fn get_profiles_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("profiles.json"))
}

/// Returns the path of the optional config file (`config.json`).
///
/// The directory is not created; an absent config is valid.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine system config directory."))?;
    Ok(config_dir.join("bairry").join("config.json"))
}
