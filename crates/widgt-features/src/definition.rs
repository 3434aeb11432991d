//! Feature definition types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The kind of resource a feature include contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeKind {
    /// A JavaScript resource injected into start-file heads.
    Script,
    /// A CSS resource injected into start-file heads.
    Stylesheet,
    /// A request handler mounted by the external router; never injected.
    Middleware,
}

/// One resource contributed by a feature definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureInclude {
    /// What kind of resource this is.
    pub kind: IncludeKind,
    /// The resource path, relative to the feature's directory.
    pub src: String,
    /// The router mount path. Only set for [`IncludeKind::Middleware`].
    pub mount_path: String,
}

/// A feature loaded from a definition file.
///
/// Owned by the [`FeatureCatalog`](crate::catalog::FeatureCatalog), which
/// refreshes it when the backing file's checksum changes and evicts it when
/// the file disappears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDefinition {
    /// The feature's declared identifier, lower-cased.
    pub id: String,
    /// The definition file this feature was loaded from.
    pub source_path: PathBuf,
    /// blake3 checksum of the definition file at load time.
    pub checksum: String,
    /// The feature's resources in declaration order.
    pub includes: Vec<FeatureInclude>,
}

impl FeatureDefinition {
    /// The includes that get injected into start files, i.e. everything
    /// except middleware.
    pub fn injectable_includes(&self) -> impl Iterator<Item = &FeatureInclude> {
        self.includes
            .iter()
            .filter(|include| include.kind != IncludeKind::Middleware)
    }

    /// The middleware includes, for the external router to mount.
    pub fn middleware_includes(&self) -> impl Iterator<Item = &FeatureInclude> {
        self.includes
            .iter()
            .filter(|include| include.kind == IncludeKind::Middleware)
    }
}
