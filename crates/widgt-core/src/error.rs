use thiserror::Error;

/// Errors raised while parsing or validating a widget manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A required input was missing or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The document is empty, or its root element is not a `widget` element
    /// in the widget namespace.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// The input could not be read or is not well-formed XML.
    #[error("manifest parse failed: {0}")]
    Parse(String),
}

/// A specialized Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors surfaced by [`WidgetRepository`](crate::repository::WidgetRepository)
/// implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store failed.
    #[error("repository backend failure: {0}")]
    Backend(String),
}

/// A specialized Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
