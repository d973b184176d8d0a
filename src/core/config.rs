//! Project configuration
//!
//! Reads `.geppetto.toml` from the target directory. Every setting is
//! optional; a missing file means defaults, an invalid file is an error.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::defaults;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Project configuration for geppetto
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Helm settings
    #[serde(default)]
    pub helm: HelmConfig,

    /// Scanner settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Unit selection
    #[serde(default)]
    pub units: UnitsConfig,
}

/// Build settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Maximum units building at once
    pub jobs: Option<usize>,

    /// Run install phases by default
    pub reinstall: Option<bool>,
}

/// Helm settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelmConfig {
    /// Chart registry for `helm push`
    pub chart_repo: Option<String>,
}

/// Scanner settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory names to skip, replacing the built-in list
    pub ignore: Option<Vec<String>>,
}

/// Unit selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitsConfig {
    /// Unit names dropped after scanning
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ProjectConfig {
    /// Load the configuration from a specific path
    ///
    /// Returns the default configuration if the file doesn't exist.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Load `.geppetto.toml` from a target directory
    pub fn load(target_dir: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path(&target_dir.join(defaults::CONFIG_FILE_NAME))
    }

    /// Effective Helm chart registry
    #[must_use]
    pub fn chart_repo(&self) -> &str {
        self.helm
            .chart_repo
            .as_deref()
            .unwrap_or(defaults::DEFAULT_CHART_REPO)
    }

    /// Effective list of ignored directory names
    #[must_use]
    pub fn ignored_dirs(&self) -> Vec<String> {
        match &self.scan.ignore {
            Some(ignore) => ignore.clone(),
            None => defaults::DEFAULT_IGNORED_DIRS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Effective reinstall flag
    #[must_use]
    pub fn reinstall(&self) -> bool {
        self.build.reinstall.unwrap_or(false)
    }
}
