//! docklift - idempotent single-host deployment
//!
//! docklift converges one containerized application onto one remote host
//! over SSH: it makes sure the container runtime, a shared network and a
//! reverse proxy exist, ships the build context, builds and starts the
//! application with its auxiliary services, waits for it to answer, and
//! routes its domain through the proxy. Every step queries the host first
//! and acts only on a difference, so any run can be repeated or resumed.
//!
//! ## Layers
//!
//! - `domain` - entities, value objects, pure services and ports
//! - `application` - use cases (infra, deploy, remove, status, init)
//! - `infrastructure` - ssh executor, context archiver, document repository
//! - `config` - engine configuration and the application document

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-exports for convenience
pub use application::{
    DeployOptions, DeployReport, DeployUseCase, InfraReport, InfraUseCase, InitUseCase,
    RemoveUseCase, RoutingReconciler, StatusReport, StatusUseCase,
};
pub use config::{EngineConfig, SettingsDocument};
pub use domain::entities::{ApplicationSpec, AuxiliaryService, HostTarget, RouteTable, Settings};
pub use error::{DockliftError, DockliftResult, ExitKind};
