use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during feature operations.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A feature definition file is missing, unreadable, or malformed.
    #[error("failed to load feature definition at {path}: {message}")]
    Load {
        /// Path to the definition file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// A start file could not be loaded into a document editor.
    #[error("failed to load start file into editor: {0}")]
    Editor(String),
}

/// A specialized Result type for feature operations.
pub type FeatureResult<T> = Result<T, FeatureError>;
