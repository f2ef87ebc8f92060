//! Runtime layer errors.
//!
//! All errors implement [`ErrorCode`] for standardized handling.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`RuntimeError::NotInitialized`] | `RUNTIME_NOT_INITIALIZED` | No |
//! | [`RuntimeError::HandshakeFailed`] | `RUNTIME_HANDSHAKE_FAILED` | No |
//! | [`RuntimeError::QueueFull`] | `RUNTIME_QUEUE_FULL` | Yes |
//! | [`RuntimeError::FrameContextMismatch`] | `RUNTIME_FRAME_CONTEXT_MISMATCH` | No |
//! | [`RuntimeError::Encode`] | `RUNTIME_ENCODE_FAILED` | No |
//! | [`RuntimeError::ChannelClosed`] | `RUNTIME_CHANNEL_CLOSED` | No |
//! | [`CallError::Host`] | `CALL_HOST_ERROR` | Yes |
//! | [`CallError::InvalidArguments`] | `CALL_INVALID_ARGUMENTS` | Yes |
//! | [`CallError::Timeout`] | `CALL_TIMEOUT` | Yes |
//! | [`CallError::ChannelClosed`] | `CALL_CHANNEL_CLOSED` | No |
//! | [`CallError::HandshakeFailed`] | `CALL_HANDSHAKE_FAILED` | No |
//! | [`CallError::Runtime`] | `CALL_RUNTIME` | No |
//! | [`CallError::UnexpectedResponse`] | `CALL_UNEXPECTED_RESPONSE` | Yes |
//! | [`HandshakeError::Timeout`] | `HANDSHAKE_TIMEOUT` | No |
//! | [`HandshakeError::Rejected`] | `HANDSHAKE_REJECTED` | No |
//! | [`HandshakeError::MalformedAck`] | `HANDSHAKE_MALFORMED_ACK` | No |
//! | [`HandshakeError::MissingApiVersion`] | `HANDSHAKE_MISSING_API_VERSION` | No |
//! | [`HandshakeError::ChannelClosed`] | `HANDSHAKE_CHANNEL_CLOSED` | No |
//! | [`HandshakeError::Encode`] | `HANDSHAKE_ENCODE_FAILED` | No |
//! | [`TransportError::Detached`] | `TRANSPORT_DETACHED` | Yes |
//! | [`TransportError::PostFailed`] | `TRANSPORT_POST_FAILED` | Yes |
//!
//! # Where each error surfaces
//!
//! - `RuntimeError` is returned synchronously when a call cannot even be
//!   submitted (programmer or state errors).
//! - `CallError` is the failure side of a submitted call's result.
//! - `HandshakeError` is the outcome of a failed `initialize()`.
//! - `TransportError` never reaches callers: the adapter logs and drops.

use hostlink_types::{CallId, ErrorCode, FrameContext};
use hostlink_wire::{HostErrorCode, SdkError, WireError};
use thiserror::Error;

/// Message carried by [`RuntimeError::NotInitialized`].
pub const NOT_INITIALIZED_MESSAGE: &str = "The library has not yet been initialized";

/// Synchronous runtime error.
///
/// # Example
///
/// ```
/// use hostlink_runtime::RuntimeError;
/// use hostlink_types::ErrorCode;
///
/// let err = RuntimeError::NotInitialized;
/// assert_eq!(err.code(), "RUNTIME_NOT_INITIALIZED");
/// assert_eq!(err.to_string(), "The library has not yet been initialized");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// `initialize()` was never called, or the handshake has not completed
    /// for an operation that requires it.
    #[error("The library has not yet been initialized")]
    NotInitialized,

    /// The handshake ended in the terminal `Failed` state.
    #[error("initialization failed: {0}")]
    HandshakeFailed(HandshakeError),

    /// The pre-handshake queue is at capacity.
    #[error("pending queue full (max={max})")]
    QueueFull { max: usize },

    /// The negotiated frame context is not one the operation allows.
    #[error("frame context '{actual}' is not one of {allowed:?}")]
    FrameContextMismatch {
        actual: FrameContext,
        allowed: Vec<FrameContext>,
    },

    /// An outbound frame could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[from] WireError),

    /// The channel was torn down.
    #[error("channel closed")]
    ChannelClosed,
}

impl ErrorCode for RuntimeError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "RUNTIME_NOT_INITIALIZED",
            Self::HandshakeFailed(_) => "RUNTIME_HANDSHAKE_FAILED",
            Self::QueueFull { .. } => "RUNTIME_QUEUE_FULL",
            Self::FrameContextMismatch { .. } => "RUNTIME_FRAME_CONTEXT_MISMATCH",
            Self::Encode(_) => "RUNTIME_ENCODE_FAILED",
            Self::ChannelClosed => "RUNTIME_CHANNEL_CLOSED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }
}

/// Failure of a submitted call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The host rejected the call. The host's structure is kept intact.
    #[error("{0}")]
    Host(SdkError),

    /// Arguments failed validation before reaching the host.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// No terminal response arrived within the deadline.
    #[error("call {id} timed out after {after_ms}ms")]
    Timeout { id: CallId, after_ms: u64 },

    /// The channel was torn down while the call was outstanding.
    #[error("channel closed")]
    ChannelClosed,

    /// The call was queued behind a handshake that failed.
    #[error("initialization failed: {0}")]
    HandshakeFailed(HandshakeError),

    /// The call could not be submitted.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The response did not have the shape the caller expected.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl CallError {
    /// Expresses this failure as a host-style error object.
    ///
    /// Callback-style entry points report failures as `SdkError`; this
    /// is the mapping they use.
    #[must_use]
    pub fn to_sdk_error(&self) -> SdkError {
        match self {
            Self::Host(err) => err.clone(),
            Self::InvalidArguments(msg) => {
                SdkError::new(HostErrorCode::InvalidArguments).with_message(msg.clone())
            }
            Self::Timeout { .. } => {
                SdkError::new(HostErrorCode::OperationTimedOut).with_message(self.to_string())
            }
            _ => SdkError::new(HostErrorCode::InternalError).with_message(self.to_string()),
        }
    }
}

impl ErrorCode for CallError {
    fn code(&self) -> &'static str {
        match self {
            Self::Host(_) => "CALL_HOST_ERROR",
            Self::InvalidArguments(_) => "CALL_INVALID_ARGUMENTS",
            Self::Timeout { .. } => "CALL_TIMEOUT",
            Self::ChannelClosed => "CALL_CHANNEL_CLOSED",
            Self::HandshakeFailed(_) => "CALL_HANDSHAKE_FAILED",
            Self::Runtime(_) => "CALL_RUNTIME",
            Self::UnexpectedResponse(_) => "CALL_UNEXPECTED_RESPONSE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Host(_) | Self::InvalidArguments(_) | Self::Timeout { .. } | Self::UnexpectedResponse(_)
        )
    }
}

/// Failed initialization handshake.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandshakeError {
    /// No acknowledgement arrived within the deadline.
    #[error("no handshake acknowledgement after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The host answered the handshake with an error.
    #[error("host rejected initialization: {0}")]
    Rejected(SdkError),

    /// The acknowledgement could not be interpreted.
    #[error("malformed handshake acknowledgement: {0}")]
    MalformedAck(String),

    /// The runtime config in the acknowledgement lacks `apiVersion`.
    #[error("runtime config has no apiVersion")]
    MissingApiVersion,

    /// The channel was torn down during the handshake.
    #[error("channel closed during initialization")]
    ChannelClosed,

    /// The outbound `initialize` call could not be encoded.
    #[error("initialize call could not be encoded: {0}")]
    Encode(WireError),
}

impl ErrorCode for HandshakeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "HANDSHAKE_TIMEOUT",
            Self::Rejected(_) => "HANDSHAKE_REJECTED",
            Self::MalformedAck(_) => "HANDSHAKE_MALFORMED_ACK",
            Self::MissingApiVersion => "HANDSHAKE_MISSING_API_VERSION",
            Self::ChannelClosed => "HANDSHAKE_CHANNEL_CLOSED",
            Self::Encode(_) => "HANDSHAKE_ENCODE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Failure reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The target window is gone (closed, navigated away, never existed).
    #[error("target window detached")]
    Detached,

    /// The underlying primitive refused the frame.
    #[error("post failed: {0}")]
    PostFailed(String),
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Detached => "TRANSPORT_DETACHED",
            Self::PostFailed(_) => "TRANSPORT_POST_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}
