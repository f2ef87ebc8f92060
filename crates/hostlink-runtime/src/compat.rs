//! Callback-style entry points.
//!
//! Thin adapters for call sites written against completion callbacks.
//! Each one submits through [`ChannelContext::invoke`] (or
//! `invoke_streaming`), spawns a task that awaits the future, and hands
//! the outcome to the callback. Failures arrive as [`SdkError`], using
//! [`CallError::to_sdk_error`](crate::CallError::to_sdk_error). They add
//! no protocol behavior: the frames posted are exactly those of the
//! future-based call.
//!
//! Submission errors (not initialized, queue full) are still returned
//! synchronously, before any task is spawned.

use crate::context::ChannelContext;
use crate::error::RuntimeError;
use hostlink_types::ApiVersionTag;
use hostlink_wire::SdkError;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::trace;

/// Outcome handed to a completion callback.
pub type CallbackResult = Result<Vec<Value>, SdkError>;

/// Submits `func` and calls `callback` once with its terminal outcome.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Any submission error from [`ChannelContext::invoke`].
pub fn invoke_with_callback<F>(
    ctx: &ChannelContext,
    func: &str,
    args: Vec<Value>,
    tag: Option<ApiVersionTag>,
    callback: F,
) -> Result<JoinHandle<()>, RuntimeError>
where
    F: FnOnce(CallbackResult) + Send + 'static,
{
    let pending = ctx.invoke(func, args, tag)?;
    let id = pending.id();
    Ok(tokio::spawn(async move {
        let result = pending.await.map_err(|e| e.to_sdk_error());
        trace!(%id, ok = result.is_ok(), "Forwarding result to callback");
        callback(result);
    }))
}

/// Submits `func` and calls `callback` for every partial response and
/// then once more for the terminal outcome.
///
/// The second callback argument is `true` for partial responses.
///
/// # Errors
///
/// Any submission error from [`ChannelContext::invoke_streaming`].
pub fn invoke_with_partial_callback<F>(
    ctx: &ChannelContext,
    func: &str,
    args: Vec<Value>,
    tag: Option<ApiVersionTag>,
    mut callback: F,
) -> Result<JoinHandle<()>, RuntimeError>
where
    F: FnMut(CallbackResult, bool) + Send + 'static,
{
    let (pending, mut progress) = ctx.invoke_streaming(func, args, tag)?;
    Ok(tokio::spawn(async move {
        // The progress stream ends when the completion is removed, so
        // every partial is seen before the terminal outcome.
        while let Some(update) = progress.next_update().await {
            callback(Ok(update), true);
        }
        callback(pending.await.map_err(|e| e.to_sdk_error()), false);
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHost;
    use hostlink_wire::HostErrorCode;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    async fn ready() -> (Arc<MockHost>, ChannelContext) {
        let host = MockHost::new("https://teams.microsoft.com");
        let ctx = ChannelContext::builder(host.clone()).build();
        let init = ctx.initialize::<&str>(&[]);
        host.ack_handshake("content", "web", json!({"apiVersion": 4, "supports": {}}));
        init.await.unwrap();
        (host, ctx)
    }

    #[tokio::test]
    async fn callback_receives_success() {
        let (host, ctx) = ready().await;
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let task = invoke_with_callback(&ctx, "getContext", vec![], None, move |r| {
            *s.lock() = Some(r);
        })
        .unwrap();

        host.respond(host.id_of("getContext").unwrap(), vec![json!("ctx")]);
        task.await.unwrap();
        assert_eq!(*seen.lock(), Some(Ok(vec![json!("ctx")])));
    }

    #[tokio::test]
    async fn callback_receives_host_error_intact() {
        let (host, ctx) = ready().await;
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let task = invoke_with_callback(&ctx, "media.selectMedia", vec![], None, move |r| {
            *s.lock() = Some(r);
        })
        .unwrap();

        let err = SdkError::new(HostErrorCode::UserAbort).with_message("cancelled");
        host.reject(host.id_of("media.selectMedia").unwrap(), &err);
        task.await.unwrap();
        assert_eq!(*seen.lock(), Some(Err(err)));
    }

    #[tokio::test]
    async fn not_initialized_is_synchronous() {
        let host = MockHost::new("https://teams.microsoft.com");
        let ctx = ChannelContext::builder(host).build();
        let result = invoke_with_callback(&ctx, "x", vec![], None, |_| {});
        assert_eq!(result.unwrap_err(), RuntimeError::NotInitialized);
    }

    #[tokio::test]
    async fn partial_callback_sees_every_update_in_order() {
        let (host, ctx) = ready().await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let task = invoke_with_partial_callback(&ctx, "media.getMedia", vec![], None, move |r, partial| {
            s.lock().push((r, partial));
        })
        .unwrap();

        let id = host.id_of("media.getMedia").unwrap();
        host.respond_partial(id, vec![json!(1)]);
        host.respond_partial(id, vec![json!(2)]);
        host.respond(id, vec![json!("done")]);
        task.await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                (Ok(vec![json!(1)]), true),
                (Ok(vec![json!(2)]), true),
                (Ok(vec![json!("done")]), false),
            ]
        );
        assert_eq!(host.posted_funcs(), vec!["initialize", "media.getMedia"]);
    }
}
