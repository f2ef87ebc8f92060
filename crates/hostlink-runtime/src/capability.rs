//! Capability table negotiated in the handshake.
//!
//! The host declares what it supports as a nested JSON object:
//!
//! ```json
//! { "apiVersion": 4, "supports": { "pages": { "tabs": {}, "config": {} }, "mail": {} } }
//! ```
//!
//! A dotted path such as `pages.tabs` is supported when every segment
//! resolves to a present value that is neither `null` nor `false`.
//! Anything absent is "not supported", never an error.

use crate::error::{HandshakeError, RuntimeError};
use hostlink_types::{compare_sdk_versions, HostClientType};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Capability descriptor installed at the end of a successful handshake.
///
/// # Example
///
/// ```
/// use hostlink_runtime::CapabilityTable;
/// use serde_json::json;
///
/// let table = CapabilityTable::from_runtime_config(&json!({
///     "apiVersion": 4,
///     "supports": { "pages": { "tabs": {} }, "mail": {} }
/// }))
/// .unwrap();
///
/// assert!(table.supports("pages.tabs"));
/// assert!(table.supports("mail"));
/// assert!(!table.supports("pages.config"));
/// assert!(!table.supports("calendar"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityTable {
    api_version: u32,
    is_legacy_host: bool,
    supports: Map<String, Value>,
}

impl CapabilityTable {
    /// Builds a table from a parsed runtime config object.
    ///
    /// # Errors
    ///
    /// - [`HandshakeError::MissingApiVersion`] if `apiVersion` is absent,
    ///   zero, or not a positive integer
    /// - [`HandshakeError::MalformedAck`] if `supports` is present but not
    ///   an object
    pub fn from_runtime_config(config: &Value) -> Result<Self, HandshakeError> {
        let api_version = config
            .get("apiVersion")
            .and_then(Value::as_u64)
            .filter(|v| *v > 0)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(HandshakeError::MissingApiVersion)?;

        let supports = match config.get("supports") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(HandshakeError::MalformedAck(format!(
                    "supports must be an object, got {other}"
                )))
            }
        };

        let is_legacy_host = config
            .get("isLegacyTeams")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(Self {
            api_version,
            is_legacy_host,
            supports,
        })
    }

    /// Synthesizes a table for a legacy host that sent no runtime config.
    ///
    /// Starts from the capability set every legacy host has and adds
    /// the capabilities introduced at or below `host_sdk_version` for the
    /// given client type. Additions replace top-level entries.
    #[must_use]
    pub fn back_compat(host_sdk_version: &str, client: &HostClientType) -> Self {
        let mut supports = legacy_base_supports();

        for (version, additions) in version_gated_capabilities() {
            let reached = matches!(
                compare_sdk_versions(host_sdk_version, version),
                Some(Ordering::Greater | Ordering::Equal)
            );
            if !reached {
                continue;
            }
            for (capability, clients) in additions {
                if clients.contains(client) {
                    if let Value::Object(entries) = capability {
                        supports.extend(entries);
                    }
                }
            }
        }

        debug!(
            version = host_sdk_version,
            client = %client,
            capabilities = supports.len(),
            "Generated back-compat capability table"
        );

        Self {
            api_version: 1,
            is_legacy_host: true,
            supports,
        }
    }

    /// Runtime config schema version the host speaks.
    #[must_use]
    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    /// `true` if this table describes a legacy host.
    #[must_use]
    pub fn is_legacy_host(&self) -> bool {
        self.is_legacy_host
    }

    /// Raw descriptor at `path`, if present.
    #[must_use]
    pub fn descriptor(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next().filter(|s| !s.is_empty())?;
        let mut current = self.supports.get(first)?;
        for segment in segments {
            if segment.is_empty() {
                return None;
            }
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Returns `true` if the host declared support for `path`.
    #[must_use]
    pub fn supports(&self, path: &str) -> bool {
        !matches!(
            self.descriptor(path),
            None | Some(Value::Null) | Some(Value::Bool(false))
        )
    }

    /// Top-level capability names.
    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.supports.keys().map(String::as_str)
    }
}

fn legacy_base_supports() -> Map<String, Value> {
    let base = json!({
        "appInstallDialog": {},
        "appEntity": {},
        "call": {},
        "chat": {},
        "conversations": {},
        "dialog": { "bot": {}, "update": {} },
        "logs": {},
        "meetingRoom": {},
        "menus": {},
        "monetization": {},
        "notifications": {},
        "pages": {
            "appButton": {},
            "tabs": {},
            "config": {},
            "backStack": {},
            "fullTrust": {}
        },
        "remoteCamera": {},
        "sharing": {},
        "stageView": {},
        "teams": { "fullTrust": {} },
        "teamsCore": {},
        "video": {}
    });
    match base {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn v1_clients() -> Vec<HostClientType> {
    vec![
        HostClientType::Desktop,
        HostClientType::Web,
        HostClientType::Android,
        HostClientType::Ios,
        HostClientType::Rigel,
        HostClientType::SurfaceHub,
        HostClientType::TeamsRoomsWindows,
        HostClientType::TeamsRoomsAndroid,
        HostClientType::TeamsPhones,
        HostClientType::TeamsDisplays,
    ]
}

/// Capabilities introduced per host SDK version, with the client types
/// that received them. Ordered by version.
fn version_gated_capabilities() -> Vec<(&'static str, Vec<(Value, Vec<HostClientType>)>)> {
    use HostClientType::{Android, Desktop, Ios, TeamsDisplays, TeamsPhones, TeamsRoomsAndroid, Web};

    vec![
        ("1.9.0", vec![(json!({ "location": {} }), v1_clients())]),
        ("2.0.0", vec![(json!({ "people": {} }), v1_clients())]),
        (
            "2.0.1",
            vec![
                (
                    json!({ "teams": { "fullTrust": { "joinedTeams": {} } } }),
                    vec![Android, Desktop, Ios, TeamsRoomsAndroid, TeamsPhones, TeamsDisplays, Web],
                ),
                (json!({ "webStorage": {} }), vec![Desktop]),
            ],
        ),
        ("2.0.5", vec![(json!({ "webStorage": {} }), vec![Android, Desktop, Ios])]),
    ]
}

/// Read side of the capability table for a channel.
///
/// Empty until the handshake installs a table; lookups before that are
/// an error so that "host said no" (`Ok(false)`) stays distinct from
/// "not known yet" (`Err`).
#[derive(Debug, Clone, Default)]
pub struct CapabilityRuntime {
    table: Option<Arc<CapabilityTable>>,
}

impl CapabilityRuntime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the negotiated table. Called once per handshake.
    pub fn install(&mut self, table: CapabilityTable) {
        self.table = Some(Arc::new(table));
    }

    /// Removes the table.
    pub fn clear(&mut self) {
        self.table = None;
    }

    /// The installed table, if any.
    #[must_use]
    pub fn table(&self) -> Option<Arc<CapabilityTable>> {
        self.table.clone()
    }

    /// Looks up `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotInitialized`] if no table is installed.
    pub fn supports(&self, path: &str) -> Result<bool, RuntimeError> {
        self.table
            .as_ref()
            .map(|t| t.supports(path))
            .ok_or(RuntimeError::NotInitialized)
    }
}
