//! Deploy Result
//!
//! Report and error types for deploy operations.

use serde::Serialize;
use thiserror::Error;

use crate::application::routing::RoutingError;
use crate::application::shell::HostError;
use crate::domain::ports::{PackageError, Stage};
use crate::domain::services::ManifestError;
use crate::error::ExitKind;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("application '{app}' has no port; run `docklift init` or set application.port")]
    PortUnassigned { app: String },

    #[error("host is not ready: {what}; run `docklift setup` first")]
    InfraMissing { what: String },

    #[error("failed to package build context: {0}")]
    Package(#[from] PackageError),

    #[error(transparent)]
    Render(#[from] ManifestError),

    #[error("{} failed: {source}", .stage.label())]
    Stage {
        stage: Stage,
        #[source]
        source: HostError,
    },

    #[error("route registration failed: {0}")]
    Routing(#[from] RoutingError),
}

impl DeployError {
    pub fn kind(&self) -> ExitKind {
        match self {
            DeployError::PortUnassigned { .. } | DeployError::Render(_) => ExitKind::Validation,
            DeployError::InfraMissing { .. } => ExitKind::InfraNotReady,
            DeployError::Package(_) => ExitKind::TransferFailed,
            DeployError::Routing(e) => e.kind(),
            DeployError::Stage { stage, source } => {
                source.transport_kind().unwrap_or(match stage {
                    Stage::Context | Stage::Manifest => ExitKind::TransferFailed,
                    Stage::Build => ExitKind::BuildFailed,
                    Stage::Start => ExitKind::StartFailed,
                    _ => ExitKind::InfraNotReady,
                })
            }
        }
    }
}

/// Outcome of the reachability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthStatus {
    /// Answered with a 2xx or 3xx status
    Healthy { code: String, attempts: u32 },
    /// Answered, but with some other status
    Responding { code: String, attempts: u32 },
    /// No answer within the budget
    TimedOut { attempts: u32 },
    Skipped,
}

impl HealthStatus {
    pub fn answered(&self) -> bool {
        matches!(
            self,
            HealthStatus::Healthy { .. } | HealthStatus::Responding { .. }
        )
    }
}

/// Result of a deploy operation
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub app: String,
    pub domain: String,
    pub port: u16,
    pub upstream: String,
    /// Digest of the uploaded context archive
    pub context_digest: String,
    pub context_files: usize,
    pub context_bytes: u64,
    pub health: HealthStatus,
    pub route_change: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_diff: Option<String>,
    pub warnings: Vec<String>,
}

impl DeployReport {
    /// `Success`, or `HealthCheckTimedOut` when the probe never got an answer.
    pub fn kind(&self) -> ExitKind {
        match self.health {
            HealthStatus::TimedOut { .. } => ExitKind::HealthCheckTimedOut,
            _ => ExitKind::Success,
        }
    }
}
