//! The deployment engine.

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use widgt_core::manifest::Content;
use widgt_core::model::uri_part_for;
use widgt_core::{ManifestError, ManifestParser, WidgetManifest, WidgetModel, WidgetRepository};
use widgt_events::{LifecycleBus, WidgtEvent};
use widgt_features::{
    DocumentEditorFactory, FeatureCatalog, FeatureProcessor, FolderFeatureProcessor,
    HtmlEditorFactory,
};

use crate::archive::WidgetArchive;
use crate::config::EngineConfig;
use crate::error::{DeployError, DeployResult};
use crate::registry::WidgetRegistry;

/// Start-file names probed, in priority order, when a manifest declares no
/// content entry. Only the package root is probed; localized variants are
/// resolved at request time instead.
pub const DEFAULT_START_FILES: &[&str] =
    &["index.html", "index.htm", "index.svg", "index.xhtml", "index.xht"];

/// The single point of contact for deploying, undeploying, and resolving
/// widgets.
///
/// Deploy and undeploy are serialized through one internal lock; `lookup`
/// and the lifecycle subscription are lock-free and support any number of
/// concurrent callers. A lookup never observes a half-extracted widget
/// because models are registered only after extraction and injection
/// complete.
pub struct DeploymentEngine {
    working_dir: PathBuf,
    repository: Arc<dyn WidgetRepository>,
    feature_processor: Arc<dyn FeatureProcessor>,
    editor_factory: Arc<dyn DocumentEditorFactory>,
    registry: WidgetRegistry,
    events: LifecycleBus,
    mutation_lock: Mutex<()>,
}

impl std::fmt::Debug for DeploymentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentEngine")
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}

impl DeploymentEngine {
    /// Create an engine over an existing working directory.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidArgument`] when `working_dir` does not
    /// exist.
    pub fn new(
        working_dir: impl Into<PathBuf>,
        repository: Arc<dyn WidgetRepository>,
        feature_processor: Arc<dyn FeatureProcessor>,
        editor_factory: Arc<dyn DocumentEditorFactory>,
    ) -> DeployResult<Self> {
        let working_dir = working_dir.into();
        if !working_dir.is_dir() {
            return Err(DeployError::InvalidArgument(format!(
                "working directory does not exist: {}",
                working_dir.display()
            )));
        }

        Ok(Self {
            working_dir,
            repository,
            feature_processor,
            editor_factory,
            registry: WidgetRegistry::new(),
            events: LifecycleBus::new(),
            mutation_lock: Mutex::new(()),
        })
    }

    /// Create an engine from a configuration, scanning the configured
    /// feature directory and using the default HTML editor.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidArgument`] when the configured widget
    /// directory does not exist.
    pub fn from_config(
        config: &EngineConfig,
        repository: Arc<dyn WidgetRepository>,
    ) -> DeployResult<Self> {
        let processor = FolderFeatureProcessor::new(
            FeatureCatalog::scan(&config.feature_dir),
            config.feature_uri_prefix.clone(),
        );
        Self::new(
            config.widget_dir.clone(),
            repository,
            Arc::new(processor),
            Arc::new(HtmlEditorFactory),
        )
    }

    /// The directory widgets are extracted into.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The lifecycle event stream. Subscribe before mutating to observe
    /// every deploy and undeploy.
    #[must_use]
    pub fn events(&self) -> &LifecycleBus {
        &self.events
    }

    /// The in-memory registry of deployed widgets.
    #[must_use]
    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    /// Deploy a widget package from a seekable archive reader.
    ///
    /// Deployment is an upsert keyed by the manifest's widget identifier:
    /// an already-deployed widget with the same identifier is undeployed
    /// first. On success the model is registered, persisted, and announced
    /// to subscribers. On failure nothing stays registered and any
    /// partially extracted directory is removed best-effort.
    ///
    /// # Errors
    ///
    /// [`DeployError::Archive`] for unreadable containers or extraction
    /// failures, [`DeployError::MissingManifest`] when the archive has no
    /// root manifest entry, [`DeployError::Manifest`] for manifest parse
    /// and validation failures (including a missing widget identifier), and
    /// [`DeployError::MissingContent`] when no start file is declared or
    /// inferable.
    pub async fn deploy<R: Read + Seek>(&self, reader: R) -> DeployResult<Arc<WidgetModel>> {
        let _guard = self.mutation_lock.lock().await;
        info!("deployment requested");

        let mut archive = WidgetArchive::open(reader)?;
        let manifest_text = archive.read_manifest()?;
        let mut manifest = ManifestParser::parse(&manifest_text)?;
        info!("manifest parsed without error");

        let widget_id = manifest
            .widget_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                DeployError::Manifest(ManifestError::InvalidManifest(
                    "manifest declares no widget id to key the deployment by".to_owned(),
                ))
            })?;

        // Deployment is an upsert keyed by widget identity: drop any prior
        // registration before extracting the new package.
        self.undeploy_locked(&widget_id).await?;

        let root = self.widget_root_dir(&widget_id);
        if let Err(e) = extract_into(&mut archive, &root) {
            best_effort_remove(&root);
            return Err(e);
        }
        info!(widget_id = %widget_id, path = %root.display(), "package contents unpacked");

        if manifest.contents.is_empty() {
            infer_start_file(&mut manifest, &root);
            if manifest.contents.is_empty() {
                error!(widget_id = %widget_id, "no start file declared and none could be inferred");
                best_effort_remove(&root);
                return Err(DeployError::MissingContent(format!(
                    "manifest declares no content entry and none of {DEFAULT_START_FILES:?} exists at the package root"
                )));
            }
        }

        let model = Arc::new(WidgetModel::new(manifest, root));

        self.feature_processor
            .process(&model, self.editor_factory.as_ref());

        if let Err(e) = self.repository.add(model.manifest().clone()).await {
            best_effort_remove(model.root_directory());
            return Err(e.into());
        }
        self.registry.insert(Arc::clone(&model));

        info!(widget_id = %widget_id, "widget deployed, notifying subscribers");
        self.events.publish(WidgtEvent::deployed(Arc::clone(&model)));

        Ok(model)
    }

    /// Undeploy the widget with the given identifier.
    ///
    /// Returns `Ok(false)`, with no side effects, when no registered widget
    /// matches. A widget directory that cannot be deleted is logged and
    /// never blocks the undeploy: the repository record and registration
    /// are removed regardless, since a redeploy recreates the directory
    /// with delete-then-create anyway.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Repository`] when the repository delete
    /// fails.
    pub async fn undeploy(&self, widget_id: &str) -> DeployResult<bool> {
        let _guard = self.mutation_lock.lock().await;
        self.undeploy_locked(widget_id).await
    }

    /// Resolve an incoming request path to a deployed widget.
    ///
    /// Returns the first registered model whose URI part is contained in
    /// `path_request`. Containment, not prefix, matching is intentionally
    /// preserved behavior; see [`WidgetRegistry::find_by_path`].
    #[must_use]
    pub fn lookup(&self, path_request: &str) -> Option<Arc<WidgetModel>> {
        self.registry.find_by_path(path_request)
    }

    async fn undeploy_locked(&self, widget_id: &str) -> DeployResult<bool> {
        let key = uri_part_for(widget_id);
        let Some(model) = self.registry.get(&key) else {
            info!(widget_id = %widget_id, "nothing to undeploy, widget is not registered");
            return Ok(false);
        };

        if model.root_directory().exists() {
            if let Err(e) = std::fs::remove_dir_all(model.root_directory()) {
                warn!(
                    widget_id = %widget_id,
                    error = %e,
                    "failed to delete widget directory, removing registration anyway"
                );
            }
        }

        self.repository.delete(widget_id).await?;
        self.registry.remove(&key);

        info!(widget_id = %widget_id, "widget undeployed, notifying subscribers");
        self.events.publish(WidgtEvent::undeployed(model));

        Ok(true)
    }

    fn widget_root_dir(&self, widget_id: &str) -> PathBuf {
        self.working_dir
            .join(widgt_core::fs::dir_name_for_id(widget_id))
    }
}

/// Recreate `root` (delete-then-create) and extract the archive into it.
fn extract_into<R: Read + Seek>(
    archive: &mut WidgetArchive<R>,
    root: &Path,
) -> DeployResult<()> {
    if root.exists() {
        std::fs::remove_dir_all(root).map_err(|e| {
            DeployError::Archive(format!(
                "failed to clear widget directory {}: {e}",
                root.display()
            ))
        })?;
    }
    std::fs::create_dir_all(root).map_err(|e| {
        DeployError::Archive(format!(
            "failed to create widget directory {}: {e}",
            root.display()
        ))
    })?;

    archive.extract_to(root)
}

fn infer_start_file(manifest: &mut WidgetManifest, root: &Path) {
    warn!("manifest declares no start file, attempting to infer one from the package contents");

    for name in DEFAULT_START_FILES {
        if root.join(name).is_file() {
            info!(start_file = name, "inferred default start file");
            manifest.contents.push(Content {
                src: (*name).to_owned(),
                ..Content::default()
            });
            return;
        }
    }
}

fn best_effort_remove(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(path) {
        warn!(path = %path.display(), error = %e, "failed to clean up widget directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use widgt_core::TransientRepository;
    use widgt_features::NullFeatureProcessor;

    #[test]
    fn engine_requires_an_existing_working_directory() {
        let err = DeploymentEngine::new(
            "/definitely/not/a/real/path",
            Arc::new(TransientRepository::new()),
            Arc::new(NullFeatureProcessor),
            Arc::new(HtmlEditorFactory),
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidArgument(_)));
    }

    #[test]
    fn widget_root_dir_is_derived_from_the_identifier() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = DeploymentEngine::new(
            tmp.path(),
            Arc::new(TransientRepository::new()),
            Arc::new(NullFeatureProcessor),
            Arc::new(HtmlEditorFactory),
        )
        .unwrap();

        assert_eq!(
            engine.widget_root_dir("http://example.org/clock"),
            tmp.path().join("example_org/clock")
        );
    }
}
