//! The persisted-manifest repository contract.
//!
//! The deployment engine treats persistence as an external collaborator
//! behind [`WidgetRepository`]. [`TransientRepository`] is the in-memory
//! implementation used by tests and embedded hosts.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::RepositoryResult;
use crate::manifest::WidgetManifest;

/// Storage contract for widget manifests, keyed by widget identifier.
#[async_trait]
pub trait WidgetRepository: Send + Sync {
    /// All stored manifests.
    async fn get_all(&self) -> RepositoryResult<Vec<WidgetManifest>>;

    /// The manifest with the given identifier, if stored.
    async fn get_by_id(&self, widget_id: &str) -> RepositoryResult<Option<WidgetManifest>>;

    /// Store a manifest, replacing any stored manifest with the same
    /// identifier.
    async fn add(&self, manifest: WidgetManifest) -> RepositoryResult<()>;

    /// Replace the stored manifest with the same identifier.
    async fn update(&self, manifest: WidgetManifest) -> RepositoryResult<()>;

    /// Remove the manifest with the given identifier. Removing an unknown
    /// identifier is a no-op.
    async fn delete(&self, widget_id: &str) -> RepositoryResult<()>;
}

/// An in-memory, non-persistent repository.
#[derive(Debug, Default)]
pub struct TransientRepository {
    store: RwLock<Vec<WidgetManifest>>,
}

impl TransientRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with existing manifests.
    #[must_use]
    pub fn with_manifests(manifests: impl IntoIterator<Item = WidgetManifest>) -> Self {
        Self {
            store: RwLock::new(manifests.into_iter().collect()),
        }
    }
}

#[async_trait]
impl WidgetRepository for TransientRepository {
    async fn get_all(&self) -> RepositoryResult<Vec<WidgetManifest>> {
        Ok(self.store.read().await.clone())
    }

    async fn get_by_id(&self, widget_id: &str) -> RepositoryResult<Option<WidgetManifest>> {
        Ok(self
            .store
            .read()
            .await
            .iter()
            .find(|m| m.widget_id.as_deref() == Some(widget_id))
            .cloned())
    }

    async fn add(&self, manifest: WidgetManifest) -> RepositoryResult<()> {
        self.update(manifest).await
    }

    async fn update(&self, manifest: WidgetManifest) -> RepositoryResult<()> {
        let mut store = self.store.write().await;
        store.retain(|m| m.widget_id != manifest.widget_id);
        store.push(manifest);
        Ok(())
    }

    async fn delete(&self, widget_id: &str) -> RepositoryResult<()> {
        self.store
            .write()
            .await
            .retain(|m| m.widget_id.as_deref() != Some(widget_id));
        Ok(())
    }
}
