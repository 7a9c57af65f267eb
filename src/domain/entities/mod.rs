//! Domain Entities
//!
//! - `ApplicationSpec` / `AuxiliaryService` - what to run
//! - `HostTarget` - where to run it
//! - `RouteTable` - the shared routing document

mod application;
mod host_target;
mod route_table;

pub use application::{ApplicationSpec, AuxiliaryService};
pub use host_target::HostTarget;
pub use route_table::{RouteChange, RouteTable, RouteTableError};

/// Validated settings of one application document.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: HostTarget,
    pub application: ApplicationSpec,
}
