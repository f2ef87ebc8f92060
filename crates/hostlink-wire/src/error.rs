//! Wire layer errors.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`WireError::NotAnObject`] | `WIRE_NOT_AN_OBJECT` | No |
//! | [`WireError::Malformed`] | `WIRE_MALFORMED` | No |
//! | [`WireError::MissingDiscriminator`] | `WIRE_MISSING_DISCRIMINATOR` | No |
//! | [`WireError::Encode`] | `WIRE_ENCODE_FAILED` | No |
//!
//! Decode errors never reach a caller's pending call: the inbound path
//! logs them and drops the frame.

use hostlink_types::ErrorCode;
use thiserror::Error;

/// Wire layer error.
///
/// # Example
///
/// ```
/// use hostlink_wire::WireError;
/// use hostlink_types::ErrorCode;
///
/// let err = WireError::MissingDiscriminator;
/// assert_eq!(err.code(), "WIRE_MISSING_DISCRIMINATOR");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The payload is not a JSON object.
    #[error("frame is not an object (got {0})")]
    NotAnObject(&'static str),

    /// A known field has the wrong type (negative id, non-array args...).
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Neither `id` nor `func` is present.
    #[error("frame carries neither an id nor a function name")]
    MissingDiscriminator,

    /// Serializing an outbound frame failed.
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

impl ErrorCode for WireError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotAnObject(_) => "WIRE_NOT_AN_OBJECT",
            Self::Malformed(_) => "WIRE_MALFORMED",
            Self::MissingDiscriminator => "WIRE_MISSING_DISCRIMINATOR",
            Self::Encode(_) => "WIRE_ENCODE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
