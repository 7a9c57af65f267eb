//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::{ColorMode, EngineConfig, Verbosity};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "DOCKLIFT_";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> ConfigResult<(EngineConfig, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: EngineConfig = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_key_warnings(unknown_paths, path, &content, ENGINE_KEYS);
    Ok((config, warnings))
}

/// Load from an explicit file, else the user config, else defaults; then
/// apply environment overrides.
///
/// An explicit path that does not exist is an error; a missing user config
/// is not.
pub fn load_or_default(explicit: Option<&Path>) -> ConfigResult<(EngineConfig, Vec<ConfigWarning>)> {
    let (config, warnings) = match explicit {
        Some(path) => load_with_warnings(path)?,
        None => match user_config_path().filter(|p| p.exists()) {
            Some(path) => load_with_warnings(&path)?,
            None => (EngineConfig::default(), Vec::new()),
        },
    };
    Ok((with_env_overrides(config), warnings))
}

/// `<config_dir>/docklift/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docklift").join("config.toml"))
}

/// Apply environment variable overrides (DOCKLIFT_* prefix)
pub fn with_env_overrides(config: EngineConfig) -> EngineConfig {
    apply_overrides(config, |key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
}

/// Apply overrides from any key lookup; `lookup` receives the name without
/// the prefix.
pub fn apply_overrides(
    mut config: EngineConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> EngineConfig {
    if let Some(dir) = lookup("BASE_DIR").filter(|v| !v.trim().is_empty()) {
        config.host.base_dir = dir.trim().to_string();
    }

    if let Some(network) = lookup("NETWORK").filter(|v| !v.trim().is_empty()) {
        config.host.network = network.trim().to_string();
    }

    if let Some(image) = lookup("PROXY_IMAGE").filter(|v| !v.trim().is_empty()) {
        config.proxy.image = image.trim().to_string();
    }

    if let Some(attempts) = lookup("HEALTH_ATTEMPTS").and_then(|v| v.trim().parse().ok()) {
        config.health.attempts = attempts;
    }

    if let Some(secs) = lookup("HEALTH_INTERVAL").and_then(|v| v.trim().parse().ok()) {
        config.health.interval_secs = secs;
    }

    if let Some(secs) = lookup("LOCK_WAIT").and_then(|v| v.trim().parse().ok()) {
        config.lock.wait_secs = secs;
    }

    if let Some(secs) = lookup("LOCK_STALE_AFTER").and_then(|v| v.trim().parse().ok()) {
        config.lock.stale_after_secs = secs;
    }

    if let Some(verbosity) = lookup("VERBOSITY") {
        config.output.verbosity = match verbosity.to_lowercase().as_str() {
            "quiet" => Verbosity::Quiet,
            "verbose" => Verbosity::Verbose,
            "debug" => Verbosity::Debug,
            _ => Verbosity::Normal,
        };
    }

    if let Some(color) = lookup("COLOR") {
        config.output.color = match color.to_lowercase().as_str() {
            "always" => ColorMode::Always,
            "never" => ColorMode::Never,
            _ => ColorMode::Auto,
        };
    }

    config
}

const ENGINE_KEYS: &[&str] = &[
    "host",
    "base_dir",
    "network",
    "proxy",
    "image",
    "health",
    "attempts",
    "interval_secs",
    "timeout_secs",
    "probe_image",
    "lock",
    "wait_secs",
    "retry_interval_ms",
    "stale_after_secs",
    "output",
    "verbosity",
    "color",
];

/// Turn `serde_ignored` paths into warnings with a line and a suggestion.
pub(crate) fn unknown_key_warnings(
    paths: Vec<String>,
    file: &Path,
    content: &str,
    candidates: &[&str],
) -> Vec<ConfigWarning> {
    paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(content, &key),
                suggestion: suggest_key(&key, candidates),
                key,
                file: file.to_path_buf(),
            }
        })
        .collect()
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains(needle))
        .map(|i| i + 1)
}

fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
