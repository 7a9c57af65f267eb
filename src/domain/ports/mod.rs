//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod context_packager;
pub mod converge_events;
pub mod remote_executor;
pub mod spec_repository;

pub use context_packager::{ContextPackager, PackageError, PackagedContext};
pub use converge_events::{ConvergeEvent, ConvergeEventSink, NoopEventSink, Stage};
pub use remote_executor::{CommandOutput, ExecError, ExecResult, RemoteExecutor};
pub use spec_repository::{SpecError, SpecRepository};
