//! Unified error interface for hostlink.
//!
//! Every error type in the workspace implements [`ErrorCode`] so that
//! callers can branch on a stable machine-readable code and decide
//! whether a failed call is worth retrying.
//!
//! # Example
//!
//! ```
//! use hostlink_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum BridgeError {
//!     OriginRejected(String),
//!     HostBusy,
//! }
//!
//! impl ErrorCode for BridgeError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::OriginRejected(_) => "BRIDGE_ORIGIN_REJECTED",
//!             Self::HostBusy => "BRIDGE_HOST_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::HostBusy)
//!     }
//! }
//!
//! let err = BridgeError::HostBusy;
//! assert_eq!(err.code(), "BRIDGE_HOST_BUSY");
//! assert!(err.is_recoverable());
//! ```

/// Machine-readable error code interface.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**: e.g. `"CALL_TIMEOUT"`
/// - **Prefixed by layer**: `WIRE_`, `TRANSPORT_`, `RUNTIME_`, `CALL_`,
///   `HANDSHAKE_`, `CONFIG_`
/// - **Stable**: codes are part of the public contract
///
/// # Recoverability
///
/// Recoverable errors are the ones a caller can reasonably retry or
/// route around at the call site (host rejected the call, deadline
/// passed). Programmer errors such as calling into the bridge before
/// `initialize()` are not recoverable: retrying without fixing the
/// integration fails the same way.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether the failure is recoverable at the call site.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows the workspace conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks the expected prefix, or is not
/// UPPER_SNAKE_CASE.
///
/// # Example
///
/// ```
/// use hostlink_types::{assert_error_code, ErrorCode};
///
/// struct Expired;
///
/// impl ErrorCode for Expired {
///     fn code(&self) -> &'static str { "CALL_EXPIRED" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Expired, "CALL_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates every variant in `errors` with [`assert_error_code`].
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
