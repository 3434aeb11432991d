//! Widget archive (zip container) handling.
//!
//! A widget package is a zip-compatible archive with a `config.xml`
//! manifest at its root. Extraction guards against hostile entry paths:
//! absolute paths and `..` traversal fail the whole deployment.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::error::{DeployError, DeployResult};

/// The manifest entry name, matched case-insensitively.
pub const MANIFEST_FILE_NAME: &str = "config.xml";

/// Maximum number of entries accepted from one archive.
const MAX_ENTRY_COUNT: usize = 10_000;

/// An opened widget archive.
pub struct WidgetArchive<R> {
    archive: ZipArchive<R>,
}

impl<R> std::fmt::Debug for WidgetArchive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetArchive").finish_non_exhaustive()
    }
}

impl<R: Read + Seek> WidgetArchive<R> {
    /// Open an archive from a seekable reader.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Archive`] when the input is not a readable
    /// zip container.
    pub fn open(reader: R) -> DeployResult<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| DeployError::Archive(format!("not a readable widget archive: {e}")))?;

        if archive.len() > MAX_ENTRY_COUNT {
            return Err(DeployError::Archive(format!(
                "archive exceeds maximum entry count ({MAX_ENTRY_COUNT})"
            )));
        }

        Ok(Self { archive })
    }

    /// Read the manifest entry's content.
    ///
    /// The entry must sit at the archive root; a `config.xml` inside a
    /// subdirectory does not count.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::MissingManifest`] when no such entry exists
    /// and [`DeployError::Archive`] when the entry cannot be read.
    pub fn read_manifest(&mut self) -> DeployResult<String> {
        let name = self
            .archive
            .file_names()
            .find(|name| name.eq_ignore_ascii_case(MANIFEST_FILE_NAME))
            .map(ToOwned::to_owned)
            .ok_or(DeployError::MissingManifest)?;

        let mut entry = self
            .archive
            .by_name(&name)
            .map_err(|e| DeployError::Archive(format!("failed to open manifest entry: {e}")))?;

        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|e| DeployError::Archive(format!("failed to read manifest entry: {e}")))?;
        Ok(text)
    }

    /// Extract every entry into `dest`, preserving the archive's directory
    /// structure.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Archive`] on any I/O failure or when an entry
    /// path is absolute or escapes `dest`. The caller owns cleanup of a
    /// partially written destination.
    pub fn extract_to(&mut self, dest: &Path) -> DeployResult<()> {
        for index in 0..self.archive.len() {
            let mut entry = self
                .archive
                .by_index(index)
                .map_err(|e| DeployError::Archive(format!("failed to read archive entry: {e}")))?;

            let Some(relative) = entry.enclosed_name() else {
                return Err(DeployError::Archive(format!(
                    "unsafe entry path in archive: {}",
                    entry.name()
                )));
            };
            let target = dest.join(relative);

            if entry.is_dir() {
                std::fs::create_dir_all(&target).map_err(|e| {
                    DeployError::Archive(format!(
                        "failed to create directory {}: {e}",
                        target.display()
                    ))
                })?;
                continue;
            }

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DeployError::Archive(format!(
                        "failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }

            let mut output = File::create(&target).map_err(|e| {
                DeployError::Archive(format!("failed to create {}: {e}", target.display()))
            })?;
            std::io::copy(&mut entry, &mut output).map_err(|e| {
                DeployError::Archive(format!("failed to unpack {}: {e}", target.display()))
            })?;

            debug!(path = %target.display(), "extracted archive entry");
        }

        Ok(())
    }
}
