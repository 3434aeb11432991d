//! Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DeployError, DeployResult};

/// Configuration for a [`DeploymentEngine`](crate::engine::DeploymentEngine).
///
/// Loadable from a TOML file; every field has a sensible default so a bare
/// file (or none at all) produces a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory widget packages are extracted into.
    pub widget_dir: PathBuf,
    /// Directory scanned for feature definitions.
    pub feature_dir: PathBuf,
    /// URI prefix prepended to injected feature resource URLs.
    pub feature_uri_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            widget_dir: PathBuf::from("widgets"),
            feature_dir: PathBuf::from("features"),
            feature_uri_prefix: "/widgt/feature".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Config`] when the file cannot be read or is
    /// not valid TOML.
    pub fn load(path: &Path) -> DeployResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DeployError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| DeployError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
