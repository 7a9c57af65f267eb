//! Configuration module for docklift
//!
//! Two documents are read from disk:
//!
//! - the engine configuration (`config.toml`), layered as
//!   1. Environment variables (DOCKLIFT_*) (highest priority)
//!   2. Explicit `--engine-config` file, else the user config
//!      (`<config_dir>/docklift/config.toml`)
//!   3. Built-in defaults (lowest priority)
//! - the per-application document (`docklift.yml`), validated into
//!   domain settings before any host is contacted.

mod document;
mod loader;
mod types;
mod validate;

pub use document::{
    ApplicationSection, Dependencies, DependencySection, SettingsDocument, VpsSection,
    DOCUMENT_FILE,
};
pub use loader::{
    apply_overrides, user_config_path, ConfigError, ConfigResult, ConfigWarning, ENV_PREFIX,
};
pub use types::{
    ColorMode, EngineConfig, HealthConfig, HostConfig, LockConfig, OutputConfig, ProxyConfig,
    Verbosity,
};
pub use validate::{expand_tilde, validate, ValidationErrors};
