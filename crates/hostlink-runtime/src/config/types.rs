//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host domains trusted out of the box.
///
/// Entries are host patterns (optionally with a port) matched against
/// `https` origins only. A single `*` label is allowed anywhere except
/// the last label.
pub const DEFAULT_TRUSTED_HOSTS: &[&str] = &[
    "teams.microsoft.com",
    "teams.microsoft.us",
    "gov.teams.microsoft.us",
    "dod.teams.microsoft.us",
    "int.teams.microsoft.com",
    "teams.live.com",
    "devspaces.skype.com",
    "ssauth.skype.com",
    "local.teams.live.com",
    "local.teams.live.com:8080",
    "local.teams.office.com",
    "local.teams.office.com:8080",
    "outlook.office.com",
    "outlook-sdf.office.com",
    "outlook.office365.com",
    "outlook-sdf.office365.com",
    "outlook.live.com",
    "outlook-sdf.live.com",
    "*.teams.microsoft.com",
    "*.www.office.com",
    "www.office.com",
    "word.office.com",
    "excel.office.com",
    "powerpoint.office.com",
    "www.officeppe.com",
    "*.www.microsoft365.com",
    "www.microsoft365.com",
    "bing.com",
    "edgeservices.bing.com",
    "www.bing.com",
    "www.staging-bing-int.com",
    "teams.cloud.microsoft",
    "outlook.cloud.microsoft",
    "m365.cloud.microsoft",
];

/// Main configuration structure.
///
/// # Example
///
/// ```
/// use hostlink_runtime::config::HostlinkConfig;
///
/// let config = HostlinkConfig::from_toml(
///     r#"
/// [timeouts]
/// call_ms = 5000
///
/// [origins]
/// additional = ["https://*.contoso.com"]
/// "#,
/// )
/// .unwrap();
/// assert_eq!(config.timeouts.initialize_ms, 60_000);
/// assert_eq!(config.timeouts.call_ms, Some(5000));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostlinkConfig {
    /// Inbound origin allow-list.
    pub origins: OriginsConfig,

    /// Handshake and call deadlines.
    pub timeouts: TimeoutsConfig,

    /// Pre-handshake queue limits.
    pub queue: QueueConfig,

    /// Versions announced in the handshake.
    pub protocol: ProtocolConfig,
}

impl HostlinkConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they
    /// differ from the default. This enables layered configuration.
    pub fn merge(&mut self, other: &Self) {
        self.origins.merge(&other.origins);
        self.timeouts.merge(&other.timeouts);
        self.queue.merge(&other.queue);
        self.protocol.merge(&other.protocol);
    }
}

/// Origin allow-list configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OriginsConfig {
    /// Host patterns accepted over `https`.
    pub trusted_hosts: Vec<String>,

    /// Extra full-origin patterns such as `https://*.contoso.com`.
    ///
    /// Entries that do not start with `https://` are ignored.
    /// Origins passed to `initialize()` are appended to this list.
    pub additional: Vec<String>,

    /// Accept frames whose origin equals [`own_origin`](Self::own_origin).
    pub allow_same_origin: bool,

    /// Origin of the embedded page itself, if known.
    pub own_origin: Option<String>,
}

impl Default for OriginsConfig {
    fn default() -> Self {
        Self {
            trusted_hosts: DEFAULT_TRUSTED_HOSTS.iter().map(|s| (*s).to_string()).collect(),
            additional: Vec::new(),
            allow_same_origin: true,
            own_origin: None,
        }
    }
}

impl OriginsConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.trusted_hosts != default.trusted_hosts {
            self.trusted_hosts = other.trusted_hosts.clone();
        }
        for origin in &other.additional {
            if !self.additional.contains(origin) {
                self.additional.push(origin.clone());
            }
        }
        if other.allow_same_origin != default.allow_same_origin {
            self.allow_same_origin = other.allow_same_origin;
        }
        if other.own_origin.is_some() {
            self.own_origin = other.own_origin.clone();
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Handshake deadline in milliseconds. Default: 60000.
    pub initialize_ms: u64,

    /// Per-call deadline in milliseconds. `None` waits indefinitely.
    pub call_ms: Option<u64>,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            initialize_ms: 60_000,
            call_ms: None,
        }
    }
}

impl TimeoutsConfig {
    /// Handshake deadline.
    #[must_use]
    pub fn initialize(&self) -> Duration {
        Duration::from_millis(self.initialize_ms)
    }

    /// Per-call deadline, if any.
    #[must_use]
    pub fn call(&self) -> Option<Duration> {
        self.call_ms.map(Duration::from_millis)
    }

    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.initialize_ms != default.initialize_ms {
            self.initialize_ms = other.initialize_ms;
        }
        if other.call_ms.is_some() {
            self.call_ms = other.call_ms;
        }
    }
}

/// Pre-handshake queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum calls held while the handshake is in flight. Default: 256.
    pub max_pending: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_pending: 256 }
    }
}

impl QueueConfig {
    fn merge(&mut self, other: &Self) {
        if other.max_pending != Self::default().max_pending {
            self.max_pending = other.max_pending;
        }
    }
}

/// Protocol versions announced to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Library version sent as the first handshake argument.
    pub sdk_version: String,

    /// Runtime config schema version this library understands.
    pub runtime_api_version: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            runtime_api_version: 4,
        }
    }
}

impl ProtocolConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.sdk_version != default.sdk_version {
            self.sdk_version = other.sdk_version.clone();
        }
        if other.runtime_api_version != default.runtime_api_version {
            self.runtime_api_version = other.runtime_api_version;
        }
    }
}
