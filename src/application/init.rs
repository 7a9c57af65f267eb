//! Init Use Case
//!
//! Writes application documents and owns the port assignment of a local
//! workspace. The workspace is the parent directory of the application's
//! root; every sibling `docklift.yml` with a port counts as taken. Scanning
//! and writing happen under the workspace lock so two inits cannot pick the
//! same port.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::{SettingsDocument, ValidationErrors};
use crate::domain::entities::Settings;
use crate::domain::ports::{SpecError, SpecRepository};
use crate::domain::services::{allocate, PortsExhausted};
use crate::domain::value_objects::{AppName, DomainName};
use crate::error::{spec_kind, ExitKind};

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("invalid application settings:\n{0}")]
    Invalid(ValidationErrors),

    #[error(transparent)]
    Ports(#[from] PortsExhausted),
}

impl InitError {
    pub fn kind(&self) -> ExitKind {
        match self {
            InitError::Spec(e) => spec_kind(e),
            InitError::Invalid(_) => ExitKind::Validation,
            InitError::Ports(_) => ExitKind::Failure,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitRequest {
    /// Where to write the document
    pub path: PathBuf,
    pub document: SettingsDocument,
    /// Replace an existing document
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitOutcome {
    pub path: PathBuf,
    pub port: u16,
    /// The port was chosen by the allocator rather than given or kept
    pub allocated: bool,
    pub replaced: bool,
}

/// Port an application deploys with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAssignment {
    pub port: u16,
    /// Chosen now and written back to the document
    pub allocated: bool,
}

pub struct InitUseCase<R: SpecRepository> {
    repository: R,
}

impl<R: SpecRepository> InitUseCase<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Write a new application document, assigning a port if it has none.
    ///
    /// Re-initialising an application keeps the port its document already
    /// records.
    pub fn init(&self, request: InitRequest) -> Result<InitOutcome, InitError> {
        let InitRequest {
            path,
            mut document,
            force,
        } = request;
        check_identity(&document)?;

        let workspace = workspace_of(&path);
        let _guard = self.repository.lock_workspace(&workspace)?;

        let existing = match self.repository.load_document(&path) {
            Ok(existing) => Some(existing),
            Err(SpecError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let replaced = existing.is_some();
        if replaced && !force {
            return Err(SpecError::AlreadyExists(path).into());
        }

        let name = document.application.name.clone();
        let kept = existing
            .filter(|e| e.application.name == name)
            .and_then(|e| e.application.port);
        let (port, allocated) = match document.application.port.or(kept) {
            Some(port) => (port, false),
            None => {
                let taken = self.repository.assigned_ports(&workspace, &name)?;
                (allocate(None, &taken)?, true)
            }
        };

        document.application.port = Some(port);
        self.repository.save_document(&path, &document)?;

        Ok(InitOutcome {
            path,
            port,
            allocated,
            replaced,
        })
    }

    /// Load and validate settings, allocating and persisting a port first if
    /// the document has none.
    pub fn ensure_port(&self, path: &Path) -> Result<(Settings, PortAssignment), InitError> {
        let mut settings = self.repository.load(path)?;
        if let Some(port) = settings.application.port {
            return Ok((
                settings,
                PortAssignment {
                    port,
                    allocated: false,
                },
            ));
        }

        let workspace = workspace_of(path);
        let _guard = self.repository.lock_workspace(&workspace)?;

        // Another run may have assigned it while we waited for the lock.
        let mut document = self.repository.load_document(path)?;
        let assignment = match document.application.port {
            Some(port) => PortAssignment {
                port,
                allocated: false,
            },
            None => {
                let taken = self
                    .repository
                    .assigned_ports(&workspace, &document.application.name)?;
                let port = allocate(None, &taken)?;
                document.application.port = Some(port);
                self.repository.save_document(path, &document)?;
                PortAssignment {
                    port,
                    allocated: true,
                }
            }
        };

        settings.application.port = Some(assignment.port);
        Ok((settings, assignment))
    }
}

/// Name and domain are checked before anything is written; the rest of the
/// document is validated at deploy time, when the key and context must exist.
fn check_identity(document: &SettingsDocument) -> Result<(), InitError> {
    let mut errors = ValidationErrors::default();
    if let Err(e) = AppName::parse(&document.application.name) {
        errors.push(format!("application.name: {e}"));
    }
    if let Err(e) = DomainName::parse(&document.application.domain) {
        errors.push(format!("application.domain: {e}"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(InitError::Invalid(errors))
    }
}

/// Directory whose application documents share one port space.
pub fn workspace_of(document: &Path) -> PathBuf {
    match document.parent() {
        Some(root) if !root.as_os_str().is_empty() => root.join(".."),
        _ => PathBuf::from(".."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_is_parent_of_application_root() {
        assert_eq!(
            workspace_of(Path::new("/work/api/docklift.yml")),
            PathBuf::from("/work/api/..")
        );
        assert_eq!(workspace_of(Path::new("docklift.yml")), PathBuf::from(".."));
    }
}
