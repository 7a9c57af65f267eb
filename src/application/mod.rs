//! Application Layer
//!
//! Use cases that orchestrate the convergence flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Talks to the host only through `RemoteExecutor`
//!
//! ## Use Cases
//!
//! - `InfraUseCase` - Brings a host to base-ready (runtime, network, proxy)
//! - `DeployUseCase` - Converges one application and registers its route
//! - `RemoveUseCase` - Takes one application off the host
//! - `StatusUseCase` - Read-only view of one application on the host
//! - `InitUseCase` - Writes application documents and assigns ports
//!
//! ## Services
//!
//! - `RoutingReconciler` - Locked read-modify-write of the routing document
//! - `HostLock` - Host-side mutual exclusion

pub mod deploy;
pub mod host_lock;
pub mod infra;
pub mod init;
pub mod remove;
pub mod routing;
mod shell;
pub mod status;

#[cfg(test)]
pub(crate) mod fake_host;

pub use deploy::{DeployError, DeployOptions, DeployReport, DeployUseCase, HealthStatus};
pub use host_lock::{force_unlock, HostLock, LockError};
pub use infra::{InfraError, InfraReport, InfraUseCase};
pub use init::{InitError, InitOutcome, InitRequest, InitUseCase, PortAssignment};
pub use remove::{RemoveError, RemoveReport, RemoveUseCase};
pub use routing::{RouteOutcome, RoutingError, RoutingReconciler};
pub use shell::HostError;
pub use status::{ContainerStatus, StatusError, StatusReport, StatusUseCase};
