//! Feature injection into widget start files.

use std::fs::File;
use std::path::Path;

use tracing::{debug, error, info, warn};

use widgt_core::WidgetModel;

use crate::catalog::FeatureCatalog;
use crate::definition::{FeatureDefinition, IncludeKind};
use crate::editor::DocumentEditorFactory;

/// Resolves feature requests and splices their resources into start files.
///
/// Implementations must never abort a deployment: anything that goes wrong
/// while processing a single start file is logged and the remaining files
/// are still processed.
pub trait FeatureProcessor: Send + Sync {
    /// Look up a feature definition by id.
    fn try_get(&self, feature_id: &str) -> Option<FeatureDefinition>;

    /// Process every start file declared by the widget's manifest.
    fn process(&self, model: &WidgetModel, editor_factory: &dyn DocumentEditorFactory);
}

/// The folder-backed processor used by the deployment engine.
///
/// Injected resource URLs take the form
/// `{prefix}?featureId={id}&file={src}` so the external router can serve
/// the resource out of the feature's own directory.
pub struct FolderFeatureProcessor {
    catalog: FeatureCatalog,
    uri_prefix: String,
}

impl FolderFeatureProcessor {
    /// Create a processor over a scanned catalog.
    #[must_use]
    pub fn new(catalog: FeatureCatalog, uri_prefix: impl Into<String>) -> Self {
        Self {
            catalog,
            uri_prefix: uri_prefix.into(),
        }
    }

    /// The catalog backing this processor.
    #[must_use]
    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    fn process_start_file(
        &self,
        model: &WidgetModel,
        file: &Path,
        editor_factory: &dyn DocumentEditorFactory,
    ) {
        info!(path = %file.display(), "injecting requested features into start file");

        let mut editor = {
            let mut input = match File::open(file) {
                Ok(f) => f,
                Err(e) => {
                    error!(path = %file.display(), error = %e, "failed to open start file");
                    return;
                },
            };
            match editor_factory.load_from(&mut input) {
                Ok(editor) => editor,
                Err(e) => {
                    error!(path = %file.display(), error = %e, "failed to load start file");
                    return;
                },
            }
        };

        let mut changed = false;

        for request in &model.manifest().features {
            let Some(definition) = self.try_get(&request.name) else {
                if request.required {
                    // A missing required feature only warns; deployment is
                    // deliberately best-effort here.
                    warn!(feature = %request.name, "required feature is not present");
                }
                continue;
            };

            // The editor only prepends, so includes go in reverse to end up
            // in declaration order.
            for include in definition.includes.iter().rev() {
                let url = format!(
                    "{}?featureId={}&file={}",
                    self.uri_prefix, definition.id, include.src
                );

                match include.kind {
                    IncludeKind::Script => {
                        editor.prepend_script(&url);
                        debug!(%url, "script injected");
                        changed = true;
                    },
                    IncludeKind::Stylesheet => {
                        editor.prepend_stylesheet(&url);
                        debug!(%url, "stylesheet injected");
                        changed = true;
                    },
                    IncludeKind::Middleware => {
                        // Mounted by the external router, never injected.
                    },
                }
            }
        }

        if changed {
            debug!(path = %file.display(), "persisting edited start file");
            let result = File::create(file)
                .and_then(|mut output| editor.write_to(&mut output));
            if let Err(e) = result {
                error!(path = %file.display(), error = %e, "failed to persist edited start file");
            }
        }
    }
}

impl FeatureProcessor for FolderFeatureProcessor {
    fn try_get(&self, feature_id: &str) -> Option<FeatureDefinition> {
        self.catalog.try_get(feature_id)
    }

    fn process(&self, model: &WidgetModel, editor_factory: &dyn DocumentEditorFactory) {
        if model.manifest().features.is_empty() {
            return;
        }

        info!(
            widget_id = model.manifest().widget_id.as_deref().unwrap_or_default(),
            "processing start files"
        );

        for content in &model.manifest().contents {
            if content.src.is_empty() {
                continue;
            }

            // A leading separator would make join() treat the source as
            // rooted and escape the widget directory.
            let relative = content.src.trim_start_matches(['/', '\\']);
            let file = model.root_directory().join(relative);

            if file.is_file() {
                self.process_start_file(model, &file, editor_factory);
            } else {
                warn!(path = %file.display(), "declared start file does not exist, skipping");
            }
        }
    }
}

/// A processor that resolves nothing and edits nothing. Useful for tests
/// and hosts without a feature directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeatureProcessor;

impl FeatureProcessor for NullFeatureProcessor {
    fn try_get(&self, _feature_id: &str) -> Option<FeatureDefinition> {
        None
    }

    fn process(&self, _model: &WidgetModel, _editor_factory: &dyn DocumentEditorFactory) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::HtmlEditorFactory;
    use widgt_core::manifest::{Content, FeatureRequest, WidgetManifest};

    use std::path::PathBuf;

    fn write_feature(root: &Path, folder: &str, body: &str) {
        let dir = root.join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(crate::catalog::FEATURE_FILE_NAME), body).unwrap();
    }

    fn widget_with_features(root: PathBuf, names: &[&str]) -> WidgetModel {
        let manifest = WidgetManifest {
            widget_id: Some("http://example.org/w".to_owned()),
            contents: vec![Content {
                src: "index.html".to_owned(),
                ..Content::default()
            }],
            features: names
                .iter()
                .map(|name| FeatureRequest {
                    name: (*name).to_owned(),
                    ..FeatureRequest::default()
                })
                .collect(),
            ..WidgetManifest::default()
        };
        WidgetModel::new(manifest, root)
    }

    #[test]
    fn injected_resources_honor_declaration_order() {
        let features = tempfile::tempdir().unwrap();
        write_feature(
            features.path(),
            "alpha",
            r#"<feature><name>feature-a</name><script src="a1.js"/><script src="a2.js"/></feature>"#,
        );
        write_feature(
            features.path(),
            "beta",
            r#"<feature><name>feature-b</name><script src="b1.js"/></feature>"#,
        );

        let widget_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            widget_dir.path().join("index.html"),
            "<html><head></head></html>",
        )
        .unwrap();

        let model = widget_with_features(
            widget_dir.path().to_path_buf(),
            &["feature-a", "feature-b"],
        );
        let processor =
            FolderFeatureProcessor::new(FeatureCatalog::scan(features.path()), "/widgt/feature");
        processor.process(&model, &HtmlEditorFactory);

        let html = std::fs::read_to_string(widget_dir.path().join("index.html")).unwrap();
        let a1 = html.find("file=a1.js").unwrap();
        let a2 = html.find("file=a2.js").unwrap();
        let b1 = html.find("file=b1.js").unwrap();
        assert!(a1 < a2, "a1 must precede a2: {html}");
        assert!(a2 < b1, "feature-a resources must precede feature-b: {html}");
    }

    #[test]
    fn missing_required_feature_does_not_block_processing() {
        let features = tempfile::tempdir().unwrap();
        write_feature(
            features.path(),
            "beta",
            r#"<feature><name>feature-b</name><stylesheet src="b.css"/></feature>"#,
        );

        let widget_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            widget_dir.path().join("index.html"),
            "<html><head></head></html>",
        )
        .unwrap();

        let model =
            widget_with_features(widget_dir.path().to_path_buf(), &["missing", "feature-b"]);
        let processor =
            FolderFeatureProcessor::new(FeatureCatalog::scan(features.path()), "/widgt/feature");
        processor.process(&model, &HtmlEditorFactory);

        let html = std::fs::read_to_string(widget_dir.path().join("index.html")).unwrap();
        assert!(html.contains("file=b.css"));
    }

    #[test]
    fn untouched_start_file_is_not_rewritten() {
        let features = tempfile::tempdir().unwrap();

        let widget_dir = tempfile::tempdir().unwrap();
        let original = "<html><head></head></html>";
        std::fs::write(widget_dir.path().join("index.html"), original).unwrap();

        let model = widget_with_features(widget_dir.path().to_path_buf(), &["missing"]);
        let processor =
            FolderFeatureProcessor::new(FeatureCatalog::scan(features.path()), "/widgt/feature");
        processor.process(&model, &HtmlEditorFactory);

        let html = std::fs::read_to_string(widget_dir.path().join("index.html")).unwrap();
        assert_eq!(html, original);
    }

    #[test]
    fn middleware_includes_are_not_injected() {
        let features = tempfile::tempdir().unwrap();
        write_feature(
            features.path(),
            "proxy",
            r#"<feature><name>proxy</name><middleware src="proxy.py" path="/proxy"/><script src="p.js"/></feature>"#,
        );

        let widget_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            widget_dir.path().join("index.html"),
            "<html><head></head></html>",
        )
        .unwrap();

        let model = widget_with_features(widget_dir.path().to_path_buf(), &["proxy"]);
        let processor =
            FolderFeatureProcessor::new(FeatureCatalog::scan(features.path()), "/widgt/feature");
        processor.process(&model, &HtmlEditorFactory);

        let html = std::fs::read_to_string(widget_dir.path().join("index.html")).unwrap();
        assert!(html.contains("file=p.js"));
        assert!(!html.contains("proxy.py"));
    }
}
