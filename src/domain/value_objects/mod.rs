//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod app_name;
mod domain_name;
mod hash;
mod host_layout;
mod volume_spec;

pub use app_name::{AppName, MAX_NAME_LEN};
pub use domain_name::DomainName;
pub use hash::ContentDigest;
pub use host_layout::{HostLayout, APP_SERVICE, DEFAULT_BASE_DIR, DEFAULT_NETWORK};
pub use volume_spec::VolumeSpec;
