//! Core model and parsing for W3C-style widget packages.
//!
//! This crate holds everything the deployment engine needs to reason about a
//! widget before any file ever touches disk: the manifest entity graph, the
//! `config.xml` parser, locale tags and the negotiation engine that reduces a
//! manifest to one entry per localized collection, and the repository
//! contract the engine persists manifests through.

pub mod error;
pub mod fs;
pub mod locale;
pub mod manifest;
pub mod model;
pub mod parser;
pub mod repository;

pub use error::{ManifestError, ManifestResult, RepositoryError, RepositoryResult};
pub use locale::{LocaleMatcher, LocaleTag};
pub use manifest::WidgetManifest;
pub use model::WidgetModel;
pub use parser::ManifestParser;
pub use repository::{TransientRepository, WidgetRepository};
