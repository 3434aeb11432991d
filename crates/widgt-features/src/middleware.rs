//! The capability-scoped middleware contract.
//!
//! Features may declare middleware resources, but the engine never executes
//! them: they are exposed through the
//! [`FeatureCatalog`](crate::catalog::FeatureCatalog) as mount points, and
//! the external request router mounts an explicit [`MiddlewareHandler`] for
//! each one. This replaces embedding a general-purpose scripting host with
//! a narrow, explicitly-registered interface.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use widgt_core::manifest::FeatureParameter;

/// A request offered to middleware handlers.
#[derive(Debug, Clone)]
pub struct MiddlewareRequest {
    /// The request path, relative to the server root.
    pub path: String,
    /// The raw query string, without the leading `?`.
    pub query: String,
}

/// A request handler mounted at a feature-declared path.
#[async_trait]
pub trait MiddlewareHandler: Send + Sync {
    /// Handle a request.
    ///
    /// `parameters` are the widget's feature-request parameters in document
    /// order. Returns `true` when the request was handled and the router
    /// should stop, `false` to fall through.
    async fn handle(&self, request: &MiddlewareRequest, parameters: &[FeatureParameter]) -> bool;
}

/// Explicitly-registered middleware handlers keyed by mount path.
#[derive(Default)]
pub struct MiddlewareMounts {
    handlers: DashMap<String, Arc<dyn MiddlewareHandler>>,
}

impl MiddlewareMounts {
    /// Create an empty mount table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler at a mount path, replacing any previous handler
    /// at the same path.
    pub fn register(&self, mount_path: impl Into<String>, handler: Arc<dyn MiddlewareHandler>) {
        let mount_path = mount_path.into();
        debug!(%mount_path, "registered middleware handler");
        self.handlers.insert(mount_path, handler);
    }

    /// Remove the handler at a mount path, if any.
    pub fn unregister(&self, mount_path: &str) -> Option<Arc<dyn MiddlewareHandler>> {
        self.handlers.remove(mount_path).map(|(_, handler)| handler)
    }

    /// The handler whose mount path the request path starts with, if any.
    ///
    /// When several mount paths prefix the same request, which one wins is
    /// unspecified; routers needing precedence should keep mounts disjoint.
    #[must_use]
    pub fn resolve(&self, request_path: &str) -> Option<Arc<dyn MiddlewareHandler>> {
        self.handlers
            .iter()
            .find(|entry| request_path.starts_with(entry.key().as_str()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Dispatch a request to its mounted handler.
    ///
    /// Returns `false` when no mount matches or the handler declined.
    pub async fn dispatch(
        &self,
        request: &MiddlewareRequest,
        parameters: &[FeatureParameter],
    ) -> bool {
        match self.resolve(&request.path) {
            Some(handler) => handler.handle(request, parameters).await,
            None => false,
        }
    }

    /// The number of registered mounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for MiddlewareMounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareMounts")
            .field("mount_count", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl MiddlewareHandler for EchoHandler {
        async fn handle(
            &self,
            request: &MiddlewareRequest,
            _parameters: &[FeatureParameter],
        ) -> bool {
            request.query.contains("handled=yes")
        }
    }

    fn request(path: &str, query: &str) -> MiddlewareRequest {
        MiddlewareRequest {
            path: path.to_owned(),
            query: query.to_owned(),
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_mount_prefix() {
        let mounts = MiddlewareMounts::new();
        mounts.register("/proxy", Arc::new(EchoHandler));

        assert!(mounts.dispatch(&request("/proxy/x", "handled=yes"), &[]).await);
        assert!(!mounts.dispatch(&request("/other", "handled=yes"), &[]).await);
    }

    #[tokio::test]
    async fn handler_may_decline_a_request() {
        let mounts = MiddlewareMounts::new();
        mounts.register("/proxy", Arc::new(EchoHandler));

        assert!(!mounts.dispatch(&request("/proxy/x", "handled=no"), &[]).await);
    }

    #[tokio::test]
    async fn unregister_removes_the_mount() {
        let mounts = MiddlewareMounts::new();
        mounts.register("/proxy", Arc::new(EchoHandler));
        assert_eq!(mounts.len(), 1);

        assert!(mounts.unregister("/proxy").is_some());
        assert!(mounts.is_empty());
        assert!(!mounts.dispatch(&request("/proxy/x", "handled=yes"), &[]).await);
    }
}
