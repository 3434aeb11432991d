//! Directory-backed feature catalog with checksum-based staleness detection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use roxmltree::Document;
use tracing::{debug, info, warn};

use crate::definition::{FeatureDefinition, FeatureInclude, IncludeKind};
use crate::error::{FeatureError, FeatureResult};

/// Standard feature definition file name.
pub const FEATURE_FILE_NAME: &str = "feature.xml";

/// A catalog of feature definitions loaded from a directory tree.
///
/// Each immediate subdirectory of the root holding a `feature.xml` yields
/// one definition, keyed by its declared, lower-cased id. Lookups verify
/// the backing file is still present and unchanged; stale definitions are
/// reloaded, vanished ones evicted. The check-then-reload sequence runs
/// under an internal lock so concurrent lookups never reload the same
/// definition twice.
#[derive(Debug)]
pub struct FeatureCatalog {
    root: PathBuf,
    cache: Mutex<HashMap<String, FeatureDefinition>>,
}

impl FeatureCatalog {
    /// Scan `root` for feature definitions and build the catalog.
    ///
    /// Subdirectories without a definition file are skipped with a note;
    /// definitions that fail to load are logged and skipped. An unreadable
    /// root yields an empty catalog.
    #[must_use]
    pub fn scan(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut cache = HashMap::new();

        info!(path = %root.display(), "scanning for feature definitions");

        match std::fs::read_dir(&root) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let dir = entry.path();
                    if !dir.is_dir() {
                        continue;
                    }

                    let definition_file = dir.join(FEATURE_FILE_NAME);
                    if !definition_file.is_file() {
                        debug!(
                            path = %dir.display(),
                            "feature directory has no definition file, skipping"
                        );
                        continue;
                    }

                    match Self::load(&definition_file) {
                        Ok(definition) => {
                            debug!(
                                feature_id = %definition.id,
                                path = %definition_file.display(),
                                "loaded feature definition"
                            );
                            cache.insert(definition.id.clone(), definition);
                        },
                        Err(e) => {
                            warn!(path = %definition_file.display(), error = %e, "failed to load feature definition");
                        },
                    }
                }
            },
            Err(e) => {
                warn!(path = %root.display(), error = %e, "feature directory is not readable");
            },
        }

        info!(count = cache.len(), "feature scan complete");

        Self {
            root,
            cache: Mutex::new(cache),
        }
    }

    /// The directory this catalog was scanned from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Case-insensitive cached lookup of a feature definition.
    ///
    /// On a hit the backing file is re-verified: a vanished file evicts the
    /// entry and misses, a changed checksum reloads the definition in
    /// place. A reload failure is logged and treated as a miss; the stale
    /// entry stays cached so a later lookup can retry once the file is
    /// fixed.
    #[must_use]
    pub fn try_get(&self, feature_id: &str) -> Option<FeatureDefinition> {
        let key = feature_id.to_lowercase();
        let mut cache = self.cache.lock().ok()?;

        let cached = cache.get(&key)?.clone();

        if !cached.source_path.is_file() {
            warn!(
                feature_id = %key,
                path = %cached.source_path.display(),
                "cached feature's definition file no longer exists, evicting"
            );
            cache.remove(&key);
            return None;
        }

        let current = match widgt_core::fs::checksum(&cached.source_path) {
            Ok(sum) => sum,
            Err(e) => {
                warn!(feature_id = %key, error = %e, "failed to checksum feature definition");
                return None;
            },
        };

        if current == cached.checksum {
            return Some(cached);
        }

        debug!(feature_id = %key, "feature definition is stale, reloading");
        match Self::load(&cached.source_path) {
            Ok(reloaded) => {
                cache.insert(key, reloaded.clone());
                Some(reloaded)
            },
            Err(e) => {
                warn!(feature_id = %key, error = %e, "failed to reload stale feature definition");
                None
            },
        }
    }

    /// Every middleware include in the catalog, paired with its owning
    /// feature id, for the external request router to mount.
    #[must_use]
    pub fn middleware_mount_points(&self) -> Vec<(String, FeatureInclude)> {
        let Ok(cache) = self.cache.lock() else {
            return Vec::new();
        };
        cache
            .values()
            .flat_map(|definition| {
                definition
                    .middleware_includes()
                    .map(|include| (definition.id.clone(), include.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Load a feature definition from a file.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Load`] when the file cannot be read, is not
    /// well-formed XML, has a root other than `feature`, or lacks a
    /// non-empty `name` child.
    pub fn load(path: &Path) -> FeatureResult<FeatureDefinition> {
        let load_error = |message: String| FeatureError::Load {
            path: path.to_path_buf(),
            message,
        };

        let text = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let document =
            Document::parse(&text).map_err(|e| load_error(format!("not well-formed XML: {e}")))?;

        let root = document.root_element();
        if root.tag_name().name() != "feature" {
            return Err(load_error(format!(
                "invalid root element, expected 'feature', got '{}'",
                root.tag_name().name()
            )));
        }

        let name = root
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == "name")
            .and_then(|n| n.text())
            .map(str::trim)
            .unwrap_or_default();
        if name.is_empty() {
            return Err(load_error("no name element present".to_owned()));
        }

        let mut includes = Vec::new();
        for element in root.children().filter(roxmltree::Node::is_element) {
            let kind = match element.tag_name().name() {
                "script" => IncludeKind::Script,
                "stylesheet" => IncludeKind::Stylesheet,
                "middleware" => IncludeKind::Middleware,
                _ => continue,
            };

            let Some(src) = element.attribute("src") else {
                continue;
            };

            let mount_path = element.attribute("path").unwrap_or_default();
            if kind == IncludeKind::Middleware && mount_path.is_empty() {
                warn!(
                    path = %path.display(),
                    src,
                    "middleware include has no mount path, skipping"
                );
                continue;
            }

            debug!(?kind, src, "feature resource found");
            includes.push(FeatureInclude {
                kind,
                src: src.to_owned(),
                mount_path: mount_path.to_owned(),
            });
        }

        Ok(FeatureDefinition {
            id: name.to_lowercase(),
            source_path: path.to_path_buf(),
            checksum: widgt_core::fs::checksum(path).map_err(|e| load_error(e.to_string()))?,
            includes,
        })
    }
}
