//! Repository Implementations
//!
//! Concrete implementations of domain repository ports.

mod spec;

pub use spec::{WorkspaceLock, YamlSpecRepository, WORKSPACE_LOCK};
