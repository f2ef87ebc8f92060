//! Configuration loader with layered merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Config files, in the order they were added
//! 3. Environment variables (`HOSTLINK_*`)
//!
//! Each layer overrides the previous.

use super::{ConfigError, HostlinkConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Helper macro for parsing boolean environment variables.
macro_rules! parse_env_bool {
    ($lookup:expr, $field:expr, $var:literal) => {
        if let Some(val) = $lookup($var) {
            $field =
                parse_bool(&val).ok_or_else(|| ConfigError::invalid_env_var($var, "expected bool"))?;
        }
    };
}

/// Helper macro for parsing unsigned integer environment variables.
macro_rules! parse_env_num {
    ($lookup:expr, $field:expr, $var:literal) => {
        if let Some(val) = $lookup($var) {
            $field = val
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env_var($var, "expected unsigned integer"))?;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```
/// use hostlink_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_file("/nonexistent/hostlink.toml")
///     .skip_env_vars()
///     .load()
///     .unwrap();
/// assert_eq!(config.queue.max_pending, 256);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Config files merged in order.
    files: Vec<PathBuf>,

    /// Skip environment variable loading.
    skip_env: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a config file layer. Missing files are skipped.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file exists but cannot be read
    /// or parsed, or if a `HOSTLINK_*` variable holds an invalid value.
    pub fn load(&self) -> Result<HostlinkConfig, ConfigError> {
        let mut config = HostlinkConfig::default();

        for path in &self.files {
            if let Some(layer) = load_file(path)? {
                debug!(path = %path.display(), "Loaded config file");
                config.merge(&layer);
            }
        }

        if !self.skip_env {
            apply_env(&mut config, |name| std::env::var(name).ok())?;
        }

        Ok(config)
    }
}

/// Loads a config file, returning None if it doesn't exist.
fn load_file(path: &Path) -> Result<Option<HostlinkConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let config =
        HostlinkConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;

    Ok(Some(config))
}

/// Applies environment variable overrides read through `lookup`.
fn apply_env(
    config: &mut HostlinkConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    parse_env_num!(lookup, config.timeouts.initialize_ms, "HOSTLINK_INITIALIZE_TIMEOUT_MS");
    parse_env_num!(lookup, config.queue.max_pending, "HOSTLINK_QUEUE_MAX_PENDING");
    parse_env_bool!(lookup, config.origins.allow_same_origin, "HOSTLINK_ALLOW_SAME_ORIGIN");

    if let Some(val) = lookup("HOSTLINK_CALL_TIMEOUT_MS") {
        let ms: u64 = val.trim().parse().map_err(|_| {
            ConfigError::invalid_env_var("HOSTLINK_CALL_TIMEOUT_MS", "expected unsigned integer")
        })?;
        config.timeouts.call_ms = Some(ms);
    }

    if let Some(val) = lookup("HOSTLINK_ADDITIONAL_ORIGINS") {
        for origin in val.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !config.origins.additional.iter().any(|o| o == origin) {
                config.origins.additional.push(origin.to_string());
            }
        }
    }

    Ok(())
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off" (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
