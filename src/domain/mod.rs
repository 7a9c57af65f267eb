//! Domain Layer
//!
//! The core of docklift - pure convergence logic without I/O dependencies.
//!
//! ## Structure
//!
//! - `entities/` - Application spec, host target, route table
//! - `value_objects/` - Validated names, volumes, host layout, digests
//! - `services/` - Port allocation, manifest rendering, host command text
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **No I/O** - This layer never touches the file system or network directly
//! 2. **Pure Functions** - Services are stateless and testable
//! 3. **Ports & Adapters** - All host interaction goes through `RemoteExecutor`

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
