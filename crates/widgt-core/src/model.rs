//! The runtime model wrapping a deployed widget.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::manifest::WidgetManifest;

/// A deployed widget: its manifest plus runtime state.
///
/// Created on successful deployment, replaced wholesale when the same
/// identifier is redeployed, and discarded on undeploy. The in-memory
/// registry owns these; the repository only ever sees the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetModel {
    manifest: WidgetManifest,
    root_directory: PathBuf,
    uri_part: String,
}

impl WidgetModel {
    /// Wrap a manifest with its extraction directory.
    #[must_use]
    pub fn new(manifest: WidgetManifest, root_directory: PathBuf) -> Self {
        let uri_part = derive_uri_part(manifest.widget_id.as_deref().unwrap_or_default());
        Self {
            manifest,
            root_directory,
            uri_part,
        }
    }

    /// The widget's parsed manifest.
    #[must_use]
    pub fn manifest(&self) -> &WidgetManifest {
        &self.manifest
    }

    /// The directory the widget's package was extracted into.
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// The URI segment used to match this widget against incoming request
    /// paths.
    #[must_use]
    pub fn uri_part(&self) -> &str {
        &self.uri_part
    }
}

/// Derive the URL-safe key for a widget identifier: strip a leading
/// `http://`/`https://` scheme (case-insensitive), percent-encode spaces,
/// and replace `.` with `_`.
///
/// The same derivation [`WidgetModel::new`] applies, exposed so callers can
/// compute a registry key from a bare identifier.
#[must_use]
pub fn uri_part_for(identifier: &str) -> String {
    derive_uri_part(identifier)
}

fn derive_uri_part(identifier: &str) -> String {
    let lower = identifier.to_ascii_lowercase();
    let stripped = if lower.starts_with("http://") {
        &identifier["http://".len()..]
    } else if lower.starts_with("https://") {
        &identifier["https://".len()..]
    } else {
        identifier
    };

    stripped.replace(' ', "%20").replace('.', "_")
}
