//! The in-memory registry of deployed widgets.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use widgt_core::WidgetModel;

/// Registry of deployed widget models, keyed by their URI-safe identifier.
///
/// An explicitly owned object guarding a concurrent map: the deployment
/// engine is its only writer, while lookups may come from any number of
/// concurrent readers. Models are `Arc`ed so a reader holding one is never
/// invalidated by a concurrent redeploy.
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    models: DashMap<String, Arc<WidgetModel>>,
}

impl WidgetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its URI part, replacing any previous model
    /// with the same key.
    pub fn insert(&self, model: Arc<WidgetModel>) {
        info!(uri_part = model.uri_part(), "registered widget");
        self.models.insert(model.uri_part().to_owned(), model);
    }

    /// The model registered under the given URI part.
    #[must_use]
    pub fn get(&self, uri_part: &str) -> Option<Arc<WidgetModel>> {
        self.models.get(uri_part).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove the model registered under the given URI part.
    pub fn remove(&self, uri_part: &str) -> Option<Arc<WidgetModel>> {
        let removed = self.models.remove(uri_part).map(|(_, model)| model);
        if removed.is_some() {
            debug!(uri_part, "unregistered widget");
        }
        removed
    }

    /// The first registered model whose URI part is contained in
    /// `path_request`.
    ///
    /// This is an intentionally preserved containment check, not a
    /// prefix/segment match: when one widget's URI part is a substring of
    /// another widget's request path, the first containment match in
    /// iteration order wins and no precedence is defined.
    #[must_use]
    pub fn find_by_path(&self, path_request: &str) -> Option<Arc<WidgetModel>> {
        self.models
            .iter()
            .find(|entry| path_request.contains(entry.key().as_str()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// All registered models.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<WidgetModel>> {
        self.models
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// The number of registered widgets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
