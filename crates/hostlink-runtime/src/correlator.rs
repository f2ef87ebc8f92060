//! Request/response correlation.
//!
//! Every outbound call gets a [`CallId`] from a monotonic counter and a
//! [`PendingCompletion`] keyed by that id. Responses are matched by id
//! alone, so the host may answer in any order.
//!
//! # Lifecycle of a completion
//!
//! ```text
//! register() ──► pending ──partial──► pending (progress sent)
//!                   │
//!                   ├──terminal──► removed, reply sent once
//!                   ├──reject()──► removed, error sent once
//!                   └──abandon()─► removed, nothing sent
//! ```
//!
//! A response for an id that is not pending (never issued, already
//! completed, abandoned) is logged and ignored.

use crate::error::CallError;
use futures::Stream;
use hostlink_types::{CallId, CallIdAllocator};
use hostlink_wire::{HostResponse, ResponseOutcome};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Terminal outcome of a call.
pub type CallResult = Result<Vec<Value>, CallError>;

/// Record of one in-flight call.
#[derive(Debug)]
pub struct PendingCompletion {
    id: CallId,
    func: String,
    reply: oneshot::Sender<CallResult>,
    progress: Option<mpsc::UnboundedSender<Vec<Value>>>,
    submitted_at: Instant,
}

impl PendingCompletion {
    #[must_use]
    pub fn id(&self) -> CallId {
        self.id
    }

    #[must_use]
    pub fn func(&self) -> &str {
        &self.func
    }

    #[must_use]
    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    fn complete(self, result: CallResult) {
        if self.reply.send(result).is_err() {
            debug!(id = %self.id, func = %self.func, "Caller dropped before completion");
        }
    }
}

/// What happened to an inbound response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Partial response; the completion is still pending.
    Progress,
    /// Terminal success; the completion was removed.
    Resolved,
    /// Terminal host error; the completion was removed.
    Rejected,
    /// No completion exists for the id.
    Unknown,
}

/// Future resolving to a call's terminal outcome.
///
/// Resolves to [`CallError::ChannelClosed`] if the completion is dropped
/// without a reply (teardown, context dropped).
#[derive(Debug)]
#[must_use = "a pending call does nothing unless awaited"]
pub struct PendingCall {
    id: CallId,
    rx: oneshot::Receiver<CallResult>,
}

impl PendingCall {
    pub(crate) fn new(id: CallId, rx: oneshot::Receiver<CallResult>) -> Self {
        Self { id, rx }
    }

    /// Id of the call this future tracks.
    #[must_use]
    pub fn id(&self) -> CallId {
        self.id
    }
}

impl Future for PendingCall {
    type Output = CallResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(CallError::ChannelClosed)))
    }
}

/// Stream of partial responses for a streaming call.
///
/// Ends when the call completes or is rejected.
#[derive(Debug)]
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<Vec<Value>>,
}

impl ProgressStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Vec<Value>>) -> Self {
        Self { rx }
    }

    /// Receives the next partial response.
    pub async fn next_update(&mut self) -> Option<Vec<Value>> {
        self.rx.recv().await
    }
}

impl Stream for ProgressStream {
    type Item = Vec<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Id allocator plus the map of pending completions.
#[derive(Debug, Default)]
pub struct Correlator {
    ids: CallIdAllocator,
    pending: HashMap<CallId, PendingCompletion>,
}

impl Correlator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id and registers a completion for it.
    pub fn register(&mut self, func: &str) -> (CallId, PendingCall) {
        let (id, rx) = self.register_inner(func, None);
        (id, PendingCall::new(id, rx))
    }

    /// Like [`register`](Self::register), also returning a stream that
    /// receives each partial response.
    pub fn register_streaming(&mut self, func: &str) -> (CallId, PendingCall, ProgressStream) {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (id, rx) = self.register_inner(func, Some(progress_tx));
        (id, PendingCall::new(id, rx), ProgressStream::new(progress_rx))
    }

    /// Allocates an id without registering a completion.
    ///
    /// Used for fire-and-forget notifications and for the handshake,
    /// whose response the channel handles itself. Any response to the
    /// id is reported as [`Resolution::Unknown`].
    pub fn next_untracked_id(&mut self) -> CallId {
        self.ids.next_id()
    }

    fn register_inner(
        &mut self,
        func: &str,
        progress: Option<mpsc::UnboundedSender<Vec<Value>>>,
    ) -> (CallId, oneshot::Receiver<CallResult>) {
        let id = self.ids.next_id();
        let (reply, rx) = oneshot::channel();

        let record = PendingCompletion {
            id,
            func: func.to_string(),
            reply,
            progress,
            submitted_at: Instant::now(),
        };
        if self.pending.insert(id, record).is_some() {
            warn!(%id, "Replaced an existing completion; ids must never repeat");
        }
        trace!(%id, func, pending = self.pending.len(), "Registered completion");
        (id, rx)
    }

    /// Applies a host response to the matching completion.
    pub fn on_response(&mut self, response: HostResponse) -> Resolution {
        let id = response.id;

        if response.is_partial_response {
            let Some(record) = self.pending.get(&id) else {
                debug!(%id, "Partial response for unknown id, ignoring");
                return Resolution::Unknown;
            };
            match &record.progress {
                Some(tx) => {
                    if tx.send(response.args).is_err() {
                        trace!(%id, "Progress receiver dropped");
                    }
                }
                None => trace!(%id, func = %record.func, "Partial response for non-streaming call"),
            }
            return Resolution::Progress;
        }

        let Some(record) = self.pending.remove(&id) else {
            debug!(%id, "Response for unknown or completed id, ignoring");
            return Resolution::Unknown;
        };

        let elapsed_ms = u64::try_from(record.submitted_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        match response.into_outcome() {
            ResponseOutcome::Success(args) => {
                debug!(%id, func = %record.func, elapsed_ms, "Call resolved");
                record.complete(Ok(args));
                Resolution::Resolved
            }
            ResponseOutcome::Failure(err) => {
                debug!(%id, func = %record.func, code = %err.error_code, elapsed_ms, "Call rejected by host");
                record.complete(Err(CallError::Host(err)));
                Resolution::Rejected
            }
        }
    }

    /// Rejects one pending completion. Returns `false` if it was not pending.
    pub fn reject(&mut self, id: CallId, error: CallError) -> bool {
        match self.pending.remove(&id) {
            Some(record) => {
                record.complete(Err(error));
                true
            }
            None => false,
        }
    }

    /// Rejects every pending completion. Returns how many were rejected.
    pub fn reject_all(&mut self, error: &CallError) -> usize {
        let count = self.pending.len();
        for (_, record) in self.pending.drain() {
            record.complete(Err(error.clone()));
        }
        if count > 0 {
            debug!(count, error = %error, "Rejected all pending completions");
        }
        count
    }

    /// Removes a completion without replying. Later responses for the id
    /// are treated as unknown.
    pub fn abandon(&mut self, id: CallId) -> bool {
        let removed = self.pending.remove(&id).is_some();
        if removed {
            debug!(%id, "Abandoned completion");
        }
        removed
    }

    #[must_use]
    pub fn is_pending(&self, id: CallId) -> bool {
        self.pending.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.ids.issued()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostlink_wire::{HostErrorCode, SdkError};
    use serde_json::json;

    #[tokio::test]
    async fn ids_start_at_zero_and_increase() {
        let mut c = Correlator::new();
        let (a, _pa) = c.register("a");
        let (b, _pb) = c.register("b");
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
        assert_eq!(c.len(), 2);
    }

    #[tokio::test]
    async fn terminal_response_resolves_and_removes() {
        let mut c = Correlator::new();
        let (id, call) = c.register("getContext");

        let res = c.on_response(HostResponse::success(id, vec![json!({"theme": "dark"})]));
        assert_eq!(res, Resolution::Resolved);
        assert!(c.is_empty());
        assert_eq!(call.await.unwrap(), vec![json!({"theme": "dark"})]);
    }

    #[tokio::test]
    async fn host_error_is_propagated_intact() {
        let mut c = Correlator::new();
        let (id, call) = c.register("media.captureImage");
        let err = SdkError::new(HostErrorCode::PermissionDenied).with_message("camera");

        assert_eq!(c.on_response(HostResponse::failure(id, &err)), Resolution::Rejected);
        assert_eq!(call.await, Err(CallError::Host(err)));
    }

    #[tokio::test]
    async fn duplicate_terminal_is_ignored() {
        let mut c = Correlator::new();
        let (id, call) = c.register("x");
        assert_eq!(
            c.on_response(HostResponse::success(id, vec![json!(1)])),
            Resolution::Resolved
        );
        assert_eq!(
            c.on_response(HostResponse::success(id, vec![json!(2)])),
            Resolution::Unknown
        );
        assert_eq!(call.await.unwrap(), vec![json!(1)]);
    }

    #[tokio::test]
    async fn partial_responses_keep_completion() {
        let mut c = Correlator::new();
        let (id, call, mut progress) = c.register_streaming("media.getMedia");

        assert_eq!(c.on_response(HostResponse::partial(id, vec![json!(1)])), Resolution::Progress);
        assert_eq!(c.on_response(HostResponse::partial(id, vec![json!(2)])), Resolution::Progress);
        assert!(c.is_pending(id));
        c.on_response(HostResponse::success(id, vec![json!("done")]));

        assert_eq!(progress.next_update().await, Some(vec![json!(1)]));
        assert_eq!(progress.next_update().await, Some(vec![json!(2)]));
        assert_eq!(progress.next_update().await, None);
        assert_eq!(call.await.unwrap(), vec![json!("done")]);
    }

    #[tokio::test]
    async fn partial_for_plain_call_is_not_terminal() {
        let mut c = Correlator::new();
        let (id, _call) = c.register("x");
        assert_eq!(c.on_response(HostResponse::partial(id, vec![])), Resolution::Progress);
        assert!(c.is_pending(id));
    }

    #[tokio::test]
    async fn unknown_id_does_not_disturb_others() {
        let mut c = Correlator::new();
        let (id, call) = c.register("x");
        assert_eq!(
            c.on_response(HostResponse::success(CallId::new(999), vec![])),
            Resolution::Unknown
        );
        assert!(c.is_pending(id));
        c.on_response(HostResponse::success(id, vec![json!(true)]));
        assert_eq!(call.await.unwrap(), vec![json!(true)]);
    }

    #[tokio::test]
    async fn reject_all_fails_every_call() {
        let mut c = Correlator::new();
        let (_, a) = c.register("a");
        let (_, b) = c.register("b");
        assert_eq!(c.reject_all(&CallError::ChannelClosed), 2);
        assert!(c.is_empty());
        assert_eq!(a.await, Err(CallError::ChannelClosed));
        assert_eq!(b.await, Err(CallError::ChannelClosed));
    }

    #[tokio::test]
    async fn abandon_makes_later_response_unknown() {
        let mut c = Correlator::new();
        let (id, call) = c.register("slow");
        assert!(c.abandon(id));
        assert!(!c.abandon(id));
        assert_eq!(c.on_response(HostResponse::success(id, vec![])), Resolution::Unknown);
        assert_eq!(call.await, Err(CallError::ChannelClosed));
    }

    #[tokio::test]
    async fn reject_single() {
        let mut c = Correlator::new();
        let (id, call) = c.register("a");
        assert!(c.reject(id, CallError::InvalidArguments("bad".into())));
        assert!(!c.reject(id, CallError::ChannelClosed));
        assert_eq!(call.await, Err(CallError::InvalidArguments("bad".into())));
    }

    #[tokio::test]
    async fn untracked_ids_share_the_sequence() {
        let mut c = Correlator::new();
        let notify = c.next_untracked_id();
        let (tracked, _call) = c.register("a");
        assert_eq!(notify.get(), 0);
        assert_eq!(tracked.get(), 1);
        assert_eq!(c.issued(), 2);
        assert_eq!(c.on_response(HostResponse::success(notify, vec![])), Resolution::Unknown);
    }

    #[tokio::test]
    async fn dropped_caller_is_tolerated() {
        let mut c = Correlator::new();
        let (id, call) = c.register("a");
        drop(call);
        assert_eq!(c.on_response(HostResponse::success(id, vec![])), Resolution::Resolved);
    }
}
