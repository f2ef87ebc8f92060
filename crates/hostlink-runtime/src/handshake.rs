//! Initialization handshake.
//!
//! # State machine
//!
//! ```text
//!                initialize()             ack
//! Uninitialized ─────────────► Initializing ─────► Initialized
//!                                   │
//!                                   │ timeout / rejection / bad ack / teardown
//!                                   ▼
//!                                 Failed
//! ```
//!
//! Transitions only move forward. The test reset hook on the channel is
//! the single way back to `Uninitialized`.
//!
//! # Acknowledgement
//!
//! The host answers the `initialize` call with
//! `[frameContext, hostClientType, runtimeConfig, clientSupportedSdkVersion]`.
//! Older hosts put the SDK version in the third slot and the runtime
//! config in the fourth, and the oldest send no runtime config at all.
//! [`parse_ack`] accepts all three layouts.

use crate::capability::CapabilityTable;
use crate::config::ProtocolConfig;
use crate::error::HandshakeError;
use hostlink_types::{FrameContext, HostClientType, SdkVersion, DEFAULT_HOST_SDK_VERSION};
use serde_json::Value;
use tracing::{debug, warn};

/// Function name of the handshake call.
pub const INITIALIZE_FUNC: &str = "initialize";

/// Handshake progress of a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum InitializationState {
    Uninitialized,
    Initializing,
    Initialized,
    Failed(HandshakeError),
}

impl InitializationState {
    /// `true` once the handshake has either succeeded or failed.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Initialized | Self::Failed(_))
    }

    /// Outcome of a settled handshake. `None` while unsettled.
    #[must_use]
    pub fn outcome(&self) -> Option<Result<(), HandshakeError>> {
        match self {
            Self::Initialized => Some(Ok(())),
            Self::Failed(e) => Some(Err(e.clone())),
            Self::Uninitialized | Self::Initializing => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Failed(_) => "failed",
        }
    }
}

/// Arguments of the handshake call.
#[must_use]
pub fn handshake_args(protocol: &ProtocolConfig) -> Vec<Value> {
    vec![
        Value::String(protocol.sdk_version.clone()),
        Value::from(protocol.runtime_api_version),
    ]
}

/// What the handshake established about the host.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedSession {
    pub frame_context: FrameContext,
    pub host_client_type: HostClientType,
    /// SDK version the host says it supports.
    pub client_supported_sdk_version: String,
    /// Runtime config schema version.
    pub api_version: u32,
    pub is_legacy_host: bool,
}

impl NegotiatedSession {
    /// `true` if the host's supported SDK version is at least `version`.
    ///
    /// Unparseable versions on either side compare as "not at least".
    #[must_use]
    pub fn is_sdk_version_at_least(&self, version: &str) -> bool {
        match (
            self.client_supported_sdk_version.parse::<SdkVersion>(),
            version.parse::<SdkVersion>(),
        ) {
            (Ok(host), Ok(required)) => host.is_at_least(&required),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_host_client_mobile(&self) -> bool {
        self.host_client_type.is_mobile()
    }
}

/// Parsed handshake acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeAck {
    pub session: NegotiatedSession,
    pub capabilities: CapabilityTable,
}

/// Interprets the host's acknowledgement.
///
/// # Errors
///
/// - [`HandshakeError::MalformedAck`] if the frame context or client
///   type is missing, or the runtime config is structurally invalid
/// - [`HandshakeError::MissingApiVersion`] if the runtime config parses
///   as JSON but is not an object, or is an object without `apiVersion`
pub fn parse_ack(args: &[Value]) -> Result<HandshakeAck, HandshakeError> {
    let frame_context: FrameContext = required_string(args, 0, "frameContext")?
        .to_string()
        .into();
    let host_client_type: HostClientType = required_string(args, 1, "hostClientType")?
        .to_string()
        .into();

    let mut sdk_version = args
        .get(3)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_HOST_SDK_VERSION)
        .to_string();

    let capabilities = match runtime_config_from(args.get(2)) {
        RuntimeConfigSlot::Config(config) => CapabilityTable::from_runtime_config(&config)?,
        RuntimeConfigSlot::Invalid(e) => return Err(e),
        RuntimeConfigSlot::NotJson => {
            // Legacy layout: slot 2 holds the SDK version, slot 3 the config.
            if let Some(v) = args.get(2).and_then(Value::as_str) {
                if v.parse::<SdkVersion>().is_ok() {
                    sdk_version = v.to_string();
                }
            }
            let fallback = Value::String(DEFAULT_HOST_SDK_VERSION.to_string());
            match parse_json_slot(args.get(3).unwrap_or(&fallback)) {
                Ok(Value::Null) => {
                    return Err(HandshakeError::MalformedAck(
                        "runtime config is null".to_string(),
                    ))
                }
                Ok(config @ Value::Object(_)) => CapabilityTable::from_runtime_config(&config)?,
                Ok(_) => return Err(HandshakeError::MissingApiVersion),
                Err(_) => {
                    debug!(version = %sdk_version, client = %host_client_type, "No runtime config in ack, using back-compat table");
                    CapabilityTable::back_compat(&sdk_version, &host_client_type)
                }
            }
        }
    };

    if sdk_version.parse::<SdkVersion>().is_err() {
        warn!(version = %sdk_version, "Host sent an unparseable SDK version");
    }

    let session = NegotiatedSession {
        frame_context,
        host_client_type,
        client_supported_sdk_version: sdk_version,
        api_version: capabilities.api_version(),
        is_legacy_host: capabilities.is_legacy_host(),
    };

    Ok(HandshakeAck {
        session,
        capabilities,
    })
}

enum RuntimeConfigSlot {
    Config(Value),
    /// Parsed, but not a usable runtime config.
    Invalid(HandshakeError),
    /// Not JSON at all; the legacy layouts apply.
    NotJson,
}

fn runtime_config_from(slot: Option<&Value>) -> RuntimeConfigSlot {
    let parsed = match slot {
        None => return RuntimeConfigSlot::NotJson,
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(v) => v,
            Err(_) => return RuntimeConfigSlot::NotJson,
        },
        Some(other) => other.clone(),
    };
    match parsed {
        config @ Value::Object(_) => RuntimeConfigSlot::Config(config),
        Value::Null => RuntimeConfigSlot::Invalid(HandshakeError::MalformedAck(
            "runtime config is null".to_string(),
        )),
        _ => RuntimeConfigSlot::Invalid(HandshakeError::MissingApiVersion),
    }
}

/// Parses a slot that should carry JSON text. Objects pass through.
fn parse_json_slot(slot: &Value) -> Result<Value, serde_json::Error> {
    match slot {
        Value::String(s) => serde_json::from_str(s),
        other => Ok(other.clone()),
    }
}

fn required_string<'a>(
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a str, HandshakeError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| HandshakeError::MalformedAck(format!("{name} (arg {index}) must be a string")))
}
