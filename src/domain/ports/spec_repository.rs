//! SpecRepository port
//!
//! Local persistence of application documents (`docklift.yml`). The
//! documents are the source of truth for re-deploys and for port allocation
//! across a workspace.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{SettingsDocument, ValidationErrors};
use crate::domain::entities::Settings;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("application document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid application document {}:\n{errors}", path.display())]
    Invalid {
        path: PathBuf,
        errors: ValidationErrors,
    },

    #[error("application document {} already exists", .0.display())]
    AlreadyExists(PathBuf),
}

/// Repository for application documents
pub trait SpecRepository {
    /// Guard returned by [`SpecRepository::lock_workspace`]; dropping it
    /// releases the lock.
    type Guard;

    /// Read the raw document without validating it.
    fn load_document(&self, path: &Path) -> Result<SettingsDocument, SpecError>;

    /// Read and validate a document into settings.
    fn load(&self, path: &Path) -> Result<Settings, SpecError>;

    /// Write a document, replacing any existing file.
    fn save_document(&self, path: &Path, document: &SettingsDocument) -> Result<(), SpecError>;

    /// Ports recorded by every application document in `workspace`, except
    /// the application named `exclude`.
    fn assigned_ports(&self, workspace: &Path, exclude: &str)
        -> Result<BTreeSet<u16>, SpecError>;

    /// Serialise port allocation within one workspace.
    fn lock_workspace(&self, workspace: &Path) -> Result<Self::Guard, SpecError>;
}
