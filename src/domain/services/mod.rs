//! Domain Services
//!
//! Pure business logic services that operate on domain entities.
//! These services have no I/O dependencies and are easily testable.

pub mod commands;
mod manifest;
mod port_allocator;

pub use manifest::{
    render_manifest, render_proxy_manifest, ManifestError, CONTEXT_DIR, PROXY_PORTS,
    RESERVED_SERVICE_KEYS,
};
pub use port_allocator::{allocate, PortsExhausted, BASE_PORT};
