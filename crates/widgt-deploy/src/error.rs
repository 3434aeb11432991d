use std::path::PathBuf;

use thiserror::Error;

use widgt_core::{ManifestError, RepositoryError};

/// Errors that can occur while deploying or undeploying widgets.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A required input was missing or invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The archive is unreadable or could not be extracted.
    #[error("widget archive could not be processed: {0}")]
    Archive(String),

    /// The archive holds no manifest entry.
    #[error("could not locate a 'config.xml' entry at the widget archive root")]
    MissingManifest,

    /// The manifest declares no start file and none could be inferred.
    #[error("no usable start file: {0}")]
    MissingContent(String),

    /// The manifest failed to parse or validate.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The external repository failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The engine configuration file could not be loaded.
    #[error("failed to load engine config at {path}: {message}")]
    Config {
        /// Path to the config file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
}

/// A specialized Result type for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;
