//! The widget deployment engine.
//!
//! Orchestrates the full deployment pipeline: open the archive, parse the
//! manifest, extract to a per-widget directory, infer a start file when the
//! manifest declares none, inject requested features, register the
//! resulting model in the in-memory registry and the external repository,
//! and notify lifecycle subscribers. Undeployment reverses the process;
//! lookup maps incoming request paths back to deployed widgets.

pub mod archive;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;

pub use archive::{MANIFEST_FILE_NAME, WidgetArchive};
pub use config::EngineConfig;
pub use engine::DeploymentEngine;
pub use error::{DeployError, DeployResult};
pub use registry::WidgetRegistry;
