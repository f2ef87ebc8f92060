//! Wire frame types.
//!
//! Three shapes cross the boundary:
//!
//! | Type | Direction | Discriminator |
//! |------|-----------|---------------|
//! | [`OutboundCall`] | page → host | `id` and `func` |
//! | [`HostResponse`] | host → page | `id` only |
//! | [`HostEvent`] | host → page | `func` only |
//!
//! An `OutboundCall` seen on the inbound path is an echo of the page's
//! own traffic (for example when host and page share a window) and is
//! ignored by the runtime.

use crate::SdkError;
use hostlink_types::{ApiVersionTag, CallId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A call from the page to the host.
///
/// Immutable once created: the correlator builds it, the transport
/// consumes it exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundCall {
    pub id: CallId,
    pub func: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version_tag: Option<ApiVersionTag>,
}

impl OutboundCall {
    #[must_use]
    pub fn new(id: CallId, func: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            id,
            func: func.into(),
            args,
            api_version_tag: None,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: Option<ApiVersionTag>) -> Self {
        self.api_version_tag = tag;
        self
    }
}

/// A response from the host, correlated to a call by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostResponse {
    pub id: CallId,
    #[serde(default)]
    pub args: Vec<Value>,
    /// When `true`, more responses for the same id will follow.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_partial_response: bool,
}

/// Success or failure of a response, as interpreted from its args.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Success(Vec<Value>),
    Failure(SdkError),
}

impl HostResponse {
    /// Terminal success response.
    #[must_use]
    pub fn success(id: CallId, args: Vec<Value>) -> Self {
        Self {
            id,
            args,
            is_partial_response: false,
        }
    }

    /// Terminal failure response carrying `error` as its first arg.
    #[must_use]
    pub fn failure(id: CallId, error: &SdkError) -> Self {
        let payload = serde_json::to_value(error).unwrap_or(Value::Null);
        Self::success(id, vec![payload])
    }

    /// Non-terminal progress response.
    #[must_use]
    pub fn partial(id: CallId, args: Vec<Value>) -> Self {
        Self {
            id,
            args,
            is_partial_response: true,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_partial_response
    }

    /// Host-reported error carried by this response, if any.
    ///
    /// A response is a failure exactly when its first arg is an object
    /// with an integer `errorCode`.
    #[must_use]
    pub fn error(&self) -> Option<SdkError> {
        self.args.first().and_then(SdkError::from_value)
    }

    /// Splits the response into success args or the host error.
    #[must_use]
    pub fn into_outcome(self) -> ResponseOutcome {
        match self.error() {
            Some(err) => ResponseOutcome::Failure(err),
            None => ResponseOutcome::Success(self.args),
        }
    }
}

/// An unsolicited message from the host, routed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    pub func: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl HostEvent {
    #[must_use]
    pub fn new(func: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            func: func.into(),
            args,
        }
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Echo of an outbound call.
    Call(OutboundCall),
    Response(HostResponse),
    Event(HostEvent),
}

impl InboundMessage {
    /// Short label used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Call(_) => "call",
            Self::Response(_) => "response",
            Self::Event(_) => "event",
        }
    }
}
