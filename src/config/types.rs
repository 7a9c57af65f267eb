//! Engine configuration type definitions

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{HostLayout, DEFAULT_BASE_DIR, DEFAULT_NETWORK};

use super::loader::{self, ConfigResult, ConfigWarning};

/// Per-host naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Root of everything the engine manages on the host
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Shared container network joined by the proxy and every application
    #[serde(default = "default_network")]
    pub network: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            network: default_network(),
        }
    }
}

fn default_base_dir() -> String {
    DEFAULT_BASE_DIR.to_string()
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

/// Reverse proxy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_image")]
    pub image: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            image: default_proxy_image(),
        }
    }
}

fn default_proxy_image() -> String {
    "caddy:2-alpine".to_string()
}

/// Health probe budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Pause between attempts
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Image used to issue the request from inside the shared network
    #[serde(default = "default_probe_image")]
    pub probe_image: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            probe_image: default_probe_image(),
        }
    }
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_attempts() -> u32 {
    10
}

fn default_interval_secs() -> u64 {
    3
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_probe_image() -> String {
    "curlimages/curl".to_string()
}

/// Host lock acquisition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// How long to keep retrying a held lock
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Age after which a lock counts as abandoned and is taken over; 0 never
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_secs: default_wait_secs(),
            retry_interval_ms: default_retry_interval_ms(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl LockConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn stale_after(&self) -> Option<Duration> {
        (self.stale_after_secs > 0).then(|| Duration::from_secs(self.stale_after_secs))
    }
}

fn default_wait_secs() -> u64 {
    30
}

fn default_stale_after_secs() -> u64 {
    3600
}

fn default_retry_interval_ms() -> u64 {
    1000
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub verbosity: Verbosity,

    #[serde(default)]
    pub color: ColorMode,
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> ConfigResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Load from an explicit file, the user config, or defaults
    pub fn load_or_default(explicit: Option<&Path>) -> ConfigResult<(Self, Vec<ConfigWarning>)> {
        loader::load_or_default(explicit)
    }

    /// Apply environment variable overrides (DOCKLIFT_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    /// Names of the per-host singletons.
    pub fn layout(&self) -> HostLayout {
        HostLayout::new(self.host.base_dir.as_str(), self.host.network.as_str())
    }
}
