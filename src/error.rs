//! Error types for docklift
//!
//! Every layer has its own `thiserror` enum; each one can say which
//! [`ExitKind`] it belongs to. `DockliftError` gathers them for callers that
//! handle more than one operation.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::application::deploy::DeployError;
use crate::application::host_lock::LockError;
use crate::application::infra::InfraError;
use crate::application::init::InitError;
use crate::application::remove::RemoveError;
use crate::application::routing::RoutingError;
use crate::application::status::StatusError;
use crate::config::ConfigError;
use crate::domain::ports::SpecError;

/// Result type alias for docklift operations
pub type DockliftResult<T> = Result<T, DockliftError>;

/// Outcome classes surfaced to the caller, each with a stable exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    Success,
    /// Probe never got an answer; everything else was applied
    HealthCheckTimedOut,
    /// Anything without a more specific class
    Failure,
    /// Malformed application document, rejected before host contact
    Validation,
    InfraNotReady,
    TransferFailed,
    BuildFailed,
    StartFailed,
    /// Shared routing document is corrupt
    RoutingConflict,
    RemoteUnreachable,
    /// Another run holds the host lock
    HostLocked,
}

impl ExitKind {
    pub fn code(self) -> i32 {
        match self {
            ExitKind::Success | ExitKind::HealthCheckTimedOut => 0,
            ExitKind::Failure => 1,
            ExitKind::Validation => 2,
            ExitKind::InfraNotReady => 10,
            ExitKind::TransferFailed => 11,
            ExitKind::BuildFailed => 12,
            ExitKind::StartFailed => 13,
            ExitKind::RoutingConflict => 14,
            ExitKind::RemoteUnreachable => 15,
            ExitKind::HostLocked => 16,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExitKind::Success => "success",
            ExitKind::HealthCheckTimedOut => "health check timed out",
            ExitKind::Failure => "failure",
            ExitKind::Validation => "invalid settings",
            ExitKind::InfraNotReady => "infrastructure not ready",
            ExitKind::TransferFailed => "transfer failed",
            ExitKind::BuildFailed => "build failed",
            ExitKind::StartFailed => "start failed",
            ExitKind::RoutingConflict => "routing conflict",
            ExitKind::RemoteUnreachable => "host unreachable",
            ExitKind::HostLocked => "host locked",
        }
    }

    pub fn is_success(self) -> bool {
        self.code() == 0
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Main error type for docklift operations
#[derive(Debug, Error)]
pub enum DockliftError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("infrastructure setup failed: {0}")]
    Infra(#[from] InfraError),

    #[error("deploy failed: {0}")]
    Deploy(#[from] DeployError),

    #[error("remove failed: {0}")]
    Remove(#[from] RemoveError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Status(#[from] StatusError),
}

impl DockliftError {
    pub fn kind(&self) -> ExitKind {
        match self {
            DockliftError::Config(_) => ExitKind::Validation,
            DockliftError::Spec(e) => spec_kind(e),
            DockliftError::Init(e) => e.kind(),
            DockliftError::Lock(e) => e.kind(),
            DockliftError::Infra(e) => e.kind(),
            DockliftError::Deploy(e) => e.kind(),
            DockliftError::Remove(e) => e.kind(),
            DockliftError::Routing(e) => e.kind(),
            DockliftError::Status(e) => e.kind(),
        }
    }
}

pub(crate) fn spec_kind(error: &SpecError) -> ExitKind {
    match error {
        SpecError::Io { .. } => ExitKind::Failure,
        SpecError::NotFound(_)
        | SpecError::Parse { .. }
        | SpecError::Invalid { .. }
        | SpecError::AlreadyExists(_) => ExitKind::Validation,
    }
}
