//! Response-shape helpers for capability wrappers.
//!
//! Capability wrappers rarely want the raw `args` array. Hosts answer in
//! a few recurring shapes and these helpers turn each into a typed
//! result:
//!
//! | Helper | Response args | Result |
//! |--------|---------------|--------|
//! | [`send_and_unwrap`] | `[value]` | `T` |
//! | [`send_and_handle_status_and_reason`] | `[ok: bool, reason?: string]` | `()` |
//! | [`send_and_handle_sdk_error`] | `[SdkError \| null, value]` | `T` |

use crate::context::ChannelContext;
use crate::correlator::CallResult;
use crate::error::CallError;
use hostlink_types::ApiVersionTag;
use hostlink_wire::{HostErrorCode, SdkError};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Calls `func` and deserializes the first response arg into `T`.
///
/// A missing first arg deserializes from `null`, so `T = Option<_>`
/// accepts an empty response.
///
/// # Errors
///
/// The call's own failure, or [`CallError::UnexpectedResponse`] if the
/// first arg is not a `T`.
pub async fn send_and_unwrap<T: DeserializeOwned>(
    ctx: &ChannelContext,
    func: &str,
    args: Vec<Value>,
    tag: Option<ApiVersionTag>,
) -> Result<T, CallError> {
    let response = ctx.call(func, args, tag).await?;
    first_as(func, response, 0)
}

/// Calls `func`, expecting `[ok, reason?]`.
///
/// # Errors
///
/// The call's own failure, or [`CallError::Host`] with
/// `INTERNAL_ERROR` carrying `reason` (or `default_reason`) when `ok`
/// is `false`.
pub async fn send_and_handle_status_and_reason(
    ctx: &ChannelContext,
    func: &str,
    args: Vec<Value>,
    tag: Option<ApiVersionTag>,
    default_reason: &str,
) -> Result<(), CallError> {
    let response = ctx.call(func, args, tag).await?;
    status_and_reason(func, &response, default_reason)
}

/// Calls `func`, expecting `[error, value]` where `error` is `null` on
/// success.
///
/// # Errors
///
/// The call's own failure, [`CallError::Host`] when the first arg is an
/// error object, or [`CallError::UnexpectedResponse`] if the second arg
/// is not a `T`.
pub async fn send_and_handle_sdk_error<T: DeserializeOwned>(
    ctx: &ChannelContext,
    func: &str,
    args: Vec<Value>,
    tag: Option<ApiVersionTag>,
) -> Result<T, CallError> {
    let response = ctx.call(func, args, tag).await?;
    sdk_error_then_value(func, response)
}

fn first_as<T: DeserializeOwned>(func: &str, mut args: Vec<Value>, index: usize) -> Result<T, CallError> {
    let value = if index < args.len() {
        args.swap_remove(index)
    } else {
        Value::Null
    };
    serde_json::from_value(value)
        .map_err(|e| CallError::UnexpectedResponse(format!("{func}: arg {index}: {e}")))
}

fn status_and_reason(func: &str, args: &[Value], default_reason: &str) -> Result<(), CallError> {
    match args.first() {
        Some(Value::Bool(true)) => Ok(()),
        Some(Value::Bool(false)) => {
            let reason = args
                .get(1)
                .and_then(Value::as_str)
                .unwrap_or(default_reason);
            Err(CallError::Host(
                SdkError::new(HostErrorCode::InternalError).with_message(reason),
            ))
        }
        other => Err(CallError::UnexpectedResponse(format!(
            "{func}: expected a status flag, got {}",
            other.map_or_else(|| "nothing".to_string(), Value::to_string)
        ))),
    }
}

fn sdk_error_then_value<T: DeserializeOwned>(func: &str, args: Vec<Value>) -> Result<T, CallError> {
    match args.first() {
        None | Some(Value::Null) => first_as(func, args, 1),
        Some(error) => match SdkError::from_value(error) {
            Some(err) => Err(CallError::Host(err)),
            None => Err(CallError::UnexpectedResponse(format!(
                "{func}: expected an error object or null, got {error}"
            ))),
        },
    }
}

/// Unwraps a [`CallResult`] into its first arg, for callers that already
/// hold a result.
///
/// # Errors
///
/// Same as [`send_and_unwrap`].
pub fn unwrap_first<T: DeserializeOwned>(func: &str, result: CallResult) -> Result<T, CallError> {
    first_as(func, result?, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Context {
        theme: String,
    }

    #[test]
    fn first_arg_deserializes() {
        let ctx: Context = first_as("getContext", vec![json!({"theme": "dark"})], 0).unwrap();
        assert_eq!(ctx, Context { theme: "dark".into() });

        let none: Option<String> = first_as("f", vec![], 0).unwrap();
        assert_eq!(none, None);

        let err = first_as::<Context>("getContext", vec![json!(3)], 0).unwrap_err();
        assert!(matches!(err, CallError::UnexpectedResponse(m) if m.starts_with("getContext")));
    }

    #[test]
    fn status_and_reason_shapes() {
        assert_eq!(status_and_reason("f", &[json!(true)], "x"), Ok(()));
        assert_eq!(
            status_and_reason("f", &[json!(false), json!("denied")], "x"),
            Err(CallError::Host(
                SdkError::new(HostErrorCode::InternalError).with_message("denied")
            ))
        );
        assert_eq!(
            status_and_reason("f", &[json!(false)], "fallback"),
            Err(CallError::Host(
                SdkError::new(HostErrorCode::InternalError).with_message("fallback")
            ))
        );
        assert!(matches!(
            status_and_reason("f", &[], "x"),
            Err(CallError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn sdk_error_then_value_shapes() {
        let ok: u32 = sdk_error_then_value("f", vec![Value::Null, json!(7)]).unwrap();
        assert_eq!(ok, 7);

        let err = sdk_error_then_value::<u32>("f", vec![json!({"errorCode": 1000, "message": "no"})])
            .unwrap_err();
        assert_eq!(
            err,
            CallError::Host(SdkError::new(HostErrorCode::PermissionDenied).with_message("no"))
        );

        assert!(matches!(
            sdk_error_then_value::<u32>("f", vec![json!("oops"), json!(1)]),
            Err(CallError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn unwrap_first_passes_errors_through() {
        assert_eq!(
            unwrap_first::<u32>("f", Err(CallError::ChannelClosed)),
            Err(CallError::ChannelClosed)
        );
        assert_eq!(unwrap_first::<u32>("f", Ok(vec![json!(5)])), Ok(5));
    }
}
