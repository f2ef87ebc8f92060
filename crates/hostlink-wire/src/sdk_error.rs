//! Structured errors reported by the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Numeric error code carried in a host rejection.
///
/// Known codes get named variants; anything else is preserved in
/// [`HostErrorCode::Unknown`] so that a rejection is never translated
/// or lost on its way back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum HostErrorCode {
    NotSupportedOnPlatform,
    FileNotFound,
    InternalError,
    NotSupportedInCurrentContext,
    PermissionDenied,
    NetworkError,
    NoHwSupport,
    InvalidArguments,
    UnauthorizedUserOperation,
    InsufficientResources,
    Throttle,
    UserAbort,
    OperationTimedOut,
    OldPlatform,
    SizeExceeded,
    Unknown(i64),
}

impl HostErrorCode {
    /// Numeric wire value.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::NotSupportedOnPlatform => 100,
            Self::FileNotFound => 404,
            Self::InternalError => 500,
            Self::NotSupportedInCurrentContext => 501,
            Self::PermissionDenied => 1000,
            Self::NetworkError => 2000,
            Self::NoHwSupport => 3000,
            Self::InvalidArguments => 4000,
            Self::UnauthorizedUserOperation => 5000,
            Self::InsufficientResources => 6000,
            Self::Throttle => 7000,
            Self::UserAbort => 8000,
            Self::OperationTimedOut => 8001,
            Self::OldPlatform => 9000,
            Self::SizeExceeded => 10000,
            Self::Unknown(code) => code,
        }
    }
}

impl From<i64> for HostErrorCode {
    fn from(code: i64) -> Self {
        match code {
            100 => Self::NotSupportedOnPlatform,
            404 => Self::FileNotFound,
            500 => Self::InternalError,
            501 => Self::NotSupportedInCurrentContext,
            1000 => Self::PermissionDenied,
            2000 => Self::NetworkError,
            3000 => Self::NoHwSupport,
            4000 => Self::InvalidArguments,
            5000 => Self::UnauthorizedUserOperation,
            6000 => Self::InsufficientResources,
            7000 => Self::Throttle,
            8000 => Self::UserAbort,
            8001 => Self::OperationTimedOut,
            9000 => Self::OldPlatform,
            10000 => Self::SizeExceeded,
            other => Self::Unknown(other),
        }
    }
}

impl From<HostErrorCode> for i64 {
    fn from(code: HostErrorCode) -> Self {
        code.as_i64()
    }
}

impl fmt::Display for HostErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Error object the host places in a response to reject a call.
///
/// Wire shape: `{ "errorCode": <integer>, "message"?: <string> }`.
///
/// # Example
///
/// ```
/// use hostlink_wire::{HostErrorCode, SdkError};
///
/// let err = SdkError::new(HostErrorCode::PermissionDenied).with_message("camera blocked");
/// let json = serde_json::to_value(&err).unwrap();
/// assert_eq!(json["errorCode"], 1000);
/// assert_eq!(SdkError::from_value(&json), Some(err));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkError {
    pub error_code: HostErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SdkError {
    #[must_use]
    pub fn new(error_code: HostErrorCode) -> Self {
        Self {
            error_code,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Interprets a JSON value as an `SdkError`.
    ///
    /// Only objects whose `errorCode` is an integer qualify; a string
    /// code, a missing code, or a non-object yields `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let code = obj.get("errorCode")?.as_i64()?;
        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            error_code: HostErrorCode::from(code),
            message,
        })
    }
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "host error {}: {}", self.error_code, msg),
            None => write!(f, "host error {}", self.error_code),
        }
    }
}

impl std::error::Error for SdkError {}
