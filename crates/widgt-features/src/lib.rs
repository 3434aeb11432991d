//! Feature catalog and start-file injection.
//!
//! A *feature* is a named, reusable bundle of script, stylesheet, and
//! middleware resources that widgets request through their manifest. This
//! crate scans a feature-definition directory tree into a cached
//! [`FeatureCatalog`], and splices requested script/stylesheet resources
//! into a widget's start files through the [`DocumentEditor`] contract.
//! Middleware resources are never injected; they are exposed for the
//! external request router to mount behind the narrow
//! [`MiddlewareHandler`] interface.

pub mod catalog;
pub mod definition;
pub mod editor;
pub mod error;
pub mod injector;
pub mod middleware;

pub use catalog::FeatureCatalog;
pub use definition::{FeatureDefinition, FeatureInclude, IncludeKind};
pub use editor::{DocumentEditor, DocumentEditorFactory, HtmlEditorFactory};
pub use error::{FeatureError, FeatureResult};
pub use injector::{FeatureProcessor, FolderFeatureProcessor, NullFeatureProcessor};
pub use middleware::{MiddlewareHandler, MiddlewareMounts, MiddlewareRequest};
