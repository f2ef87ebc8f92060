//! Frame encoding and decoding.
//!
//! Outbound frames are serialized with serde. Inbound frames are first
//! validated against a loose schema ([`RawFrame`]) and then classified
//! by which discriminators they carry:
//!
//! | `id` | `func` | Result |
//! |------|--------|--------|
//! | yes  | no     | [`InboundMessage::Response`] |
//! | no   | yes    | [`InboundMessage::Event`] |
//! | yes  | yes    | [`InboundMessage::Call`] (echo) |
//! | no   | no     | [`WireError::MissingDiscriminator`] |
//!
//! Fields this library does not know are ignored. Known fields with the
//! wrong type reject the whole frame.

use crate::{HostEvent, HostResponse, InboundMessage, OutboundCall, WireError};
use hostlink_types::{ApiVersionTag, CallId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema of any inbound frame before classification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrame {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    func: Option<String>,
    #[serde(default)]
    args: Option<Vec<Value>>,
    #[serde(default)]
    is_partial_response: Option<bool>,
    #[serde(default)]
    api_version_tag: Option<String>,
}

/// Encodes an outbound call into its wire payload.
///
/// # Errors
///
/// Returns [`WireError::Encode`] if serialization fails.
pub fn encode(call: &OutboundCall) -> Result<Value, WireError> {
    to_payload(call)
}

/// Encodes a host response. Used by host-side test doubles.
///
/// # Errors
///
/// Returns [`WireError::Encode`] if serialization fails.
pub fn encode_response(response: &HostResponse) -> Result<Value, WireError> {
    to_payload(response)
}

/// Encodes a host event. Used by host-side test doubles.
///
/// # Errors
///
/// Returns [`WireError::Encode`] if serialization fails.
pub fn encode_event(event: &HostEvent) -> Result<Value, WireError> {
    to_payload(event)
}

fn to_payload<T: Serialize>(frame: &T) -> Result<Value, WireError> {
    serde_json::to_value(frame).map_err(|e| WireError::Encode(e.to_string()))
}

/// Decodes an inbound payload.
///
/// # Errors
///
/// - [`WireError::NotAnObject`] if `payload` is not a JSON object
/// - [`WireError::Malformed`] if a known field has the wrong type
/// - [`WireError::MissingDiscriminator`] if neither `id` nor `func` is set
///
/// # Example
///
/// ```
/// use hostlink_wire::{decode, InboundMessage};
/// use serde_json::json;
///
/// let msg = decode(&json!({"id": 4, "args": [true]})).unwrap();
/// assert!(matches!(msg, InboundMessage::Response(r) if r.id.get() == 4));
///
/// let msg = decode(&json!({"func": "themeChange", "args": ["dark"]})).unwrap();
/// assert!(matches!(msg, InboundMessage::Event(e) if e.func == "themeChange"));
///
/// assert!(decode(&json!({"args": []})).is_err());
/// ```
pub fn decode(payload: &Value) -> Result<InboundMessage, WireError> {
    if !payload.is_object() {
        return Err(WireError::NotAnObject(json_type_name(payload)));
    }

    let raw: RawFrame =
        RawFrame::deserialize(payload).map_err(|e| WireError::Malformed(e.to_string()))?;
    let args = raw.args.unwrap_or_default();

    match (raw.id, raw.func) {
        (Some(id), None) => Ok(InboundMessage::Response(HostResponse {
            id: CallId::new(id),
            args,
            is_partial_response: raw.is_partial_response.unwrap_or(false),
        })),
        (None, Some(func)) => Ok(InboundMessage::Event(HostEvent { func, args })),
        (Some(id), Some(func)) => Ok(InboundMessage::Call(OutboundCall {
            id: CallId::new(id),
            func,
            args,
            api_version_tag: raw.api_version_tag.map(ApiVersionTag::from_raw),
        })),
        (None, None) => Err(WireError::MissingDiscriminator),
    }
}

/// Decodes a payload delivered as JSON text.
///
/// # Errors
///
/// Returns [`WireError::Malformed`] for invalid JSON, otherwise the
/// errors of [`decode`].
pub fn decode_str(text: &str) -> Result<InboundMessage, WireError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| WireError::Malformed(e.to_string()))?;
    decode(&value)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
