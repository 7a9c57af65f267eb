//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `remote/` - ssh/scp executor for the target host
//! - `packaging/` - build context archiver honouring `.dockerignore`
//! - `repositories/` - application document repository
//! - `events/` - machine-readable event sinks

pub mod events;
pub mod packaging;
pub mod remote;
pub mod repositories;

// Re-export for convenience
pub use events::JsonEventSink;
pub use packaging::{ContextArchiver, DockerIgnore};
pub use remote::SshExecutor;
pub use repositories::{YamlSpecRepository, WORKSPACE_LOCK};
