//! Deploy Module
//!
//! Converges one application on a base-ready host.
//!
//! ## Structure
//!
//! - `options` - Per-run switches (`DeployOptions`)
//! - `result` - Report and error types (`DeployReport`, `DeployError`)
//! - `use_case` - The pipeline (`DeployUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use docklift::application::deploy::{DeployOptions, DeployUseCase};
//!
//! let use_case = DeployUseCase::new(&executor, ContextArchiver::new(), config);
//! let report = use_case.execute(&spec, &DeployOptions::default())?;
//! ```

mod options;
mod result;
mod use_case;

pub use options::DeployOptions;
pub use result::{DeployError, DeployReport, HealthStatus};
pub use use_case::DeployUseCase;
