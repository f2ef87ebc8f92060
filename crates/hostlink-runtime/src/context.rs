//! Channel context: one embedded page talking to one host.
//!
//! A [`ChannelContext`] owns everything that would otherwise be
//! process-wide state: the handshake state, the capability table, the
//! pending-call map, the pre-handshake queue and the event handler
//! slots. Several contexts can coexist in one process (one per test,
//! one per embedded surface).
//!
//! # Call flow
//!
//! ```text
//! invoke(func, args)
//!     │
//!     ├─ Uninitialized ──► Err(NotInitialized)
//!     ├─ Failed ─────────► Err(HandshakeFailed)
//!     ├─ Initializing ───► register completion ──► PendingQueue
//!     └─ Initialized ────► register completion ──► TransportAdapter::send
//!
//! inbound frame ──► TransportAdapter::accept ──► handle_inbound
//!     ├─ Response(handshake id) ──► parse ack ──► install capabilities, flush queue
//!     ├─ Response(other id) ──────► Correlator::on_response
//!     ├─ Event ───────────────────► EventDispatcher::dispatch (no lock held)
//!     └─ Call echo ───────────────► ignored
//! ```
//!
//! # Locking
//!
//! All mutable channel state sits in one `parking_lot::Mutex`. Frames
//! are posted while it is held, which is what keeps the flushed queue
//! and any call made concurrently in issue order. Event handlers run
//! after it is released. Completions are delivered through channels, so
//! awaiting callers resume outside the lock too.
//!
//! # Example
//!
//! ```
//! use hostlink_runtime::testing::MockHost;
//! use hostlink_runtime::ChannelContext;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let host = MockHost::new("https://teams.microsoft.com");
//! let ctx = ChannelContext::builder(host.clone()).build();
//!
//! let init = ctx.initialize::<&str>(&[]);
//! let pending = ctx.invoke("getContext", vec![], None).unwrap();
//! assert_eq!(host.posted_funcs(), vec!["initialize"]);
//!
//! host.ack_handshake("content", "web", json!({ "apiVersion": 4, "supports": { "pages": {} } }));
//! init.await.unwrap();
//! assert_eq!(host.posted_funcs(), vec!["initialize", "getContext"]);
//!
//! host.respond(pending.id(), vec![json!({ "theme": "dark" })]);
//! assert_eq!(pending.await.unwrap(), vec![json!({ "theme": "dark" })]);
//! assert_eq!(ctx.is_supported("pages"), Ok(true));
//! # }
//! ```

use crate::capability::{CapabilityRuntime, CapabilityTable};
use crate::config::HostlinkConfig;
use crate::correlator::{CallResult, Correlator, PendingCall, ProgressStream};
use crate::dispatcher::{DispatchOutcome, EventDispatcher, EventHandler, REGISTER_HANDLER_FUNC};
use crate::error::{CallError, HandshakeError, RuntimeError};
use crate::handshake::{
    handshake_args, parse_ack, HandshakeAck, InitializationState, NegotiatedSession,
    INITIALIZE_FUNC,
};
use crate::queue::PendingQueue;
use crate::transport::{OriginPolicy, TargetWindow, Transport, TransportAdapter};
use hostlink_types::{ApiVersionTag, CallId, ChannelId, FrameContext};
use hostlink_wire::{HostErrorCode, HostResponse, InboundMessage, OutboundCall, ResponseOutcome, SdkError};
use parking_lot::Mutex;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Builder for [`ChannelContext`].
///
/// ```
/// use hostlink_runtime::testing::MockHost;
/// use hostlink_runtime::{ChannelContext, HostlinkConfig, TargetWindow};
///
/// let host = MockHost::new("https://teams.microsoft.com");
/// let ctx = ChannelContext::builder(host)
///     .with_target(TargetWindow::Opener)
///     .with_config(HostlinkConfig::default())
///     .build();
/// assert_eq!(ctx.target(), TargetWindow::Opener);
/// ```
pub struct ChannelContextBuilder {
    transport: Arc<dyn Transport>,
    target: TargetWindow,
    config: HostlinkConfig,
}

impl ChannelContextBuilder {
    /// Creates a builder posting to the parent window with default config.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            target: TargetWindow::Parent,
            config: HostlinkConfig::default(),
        }
    }

    /// Sets the window frames are posted to.
    #[must_use]
    pub fn with_target(mut self, target: TargetWindow) -> Self {
        self.target = target;
        self
    }

    /// Sets origins, timeouts, queue limits and protocol versions.
    #[must_use]
    pub fn with_config(mut self, config: HostlinkConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn build(self) -> ChannelContext {
        let id = ChannelId::new();
        let policy = OriginPolicy::from_config(&self.config.origins);
        let adapter = Arc::new(TransportAdapter::new(self.transport, self.target, policy));
        let (state_tx, _) = watch::channel(InitializationState::Uninitialized);

        debug!(channel = %id, target = ?self.target, "Created channel context");

        ChannelContext {
            inner: Arc::new(Inner {
                id,
                shared: Mutex::new(Shared::new(self.config.queue.max_pending)),
                config: self.config,
                adapter,
                dispatcher: EventDispatcher::new(),
                state_tx,
            }),
        }
    }
}

/// Handle to one channel. Cheap to clone; clones share state.
///
/// Dropping the last handle closes the channel: the inbound listener is
/// removed and awaiting callers resolve with [`CallError::ChannelClosed`].
#[derive(Clone)]
pub struct ChannelContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ChannelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelContext")
            .field("id", &self.inner.id)
            .field("state", &self.state().name())
            .finish_non_exhaustive()
    }
}

struct Inner {
    id: ChannelId,
    config: HostlinkConfig,
    adapter: Arc<TransportAdapter>,
    shared: Mutex<Shared>,
    dispatcher: EventDispatcher,
    state_tx: watch::Sender<InitializationState>,
}

struct Shared {
    state: InitializationState,
    correlator: Correlator,
    queue: PendingQueue,
    /// Id of the in-flight handshake call.
    handshake: Option<CallId>,
    handshake_deadline: Option<Instant>,
    capabilities: CapabilityRuntime,
    session: Option<NegotiatedSession>,
    closed: bool,
}

impl Shared {
    fn new(max_pending: usize) -> Self {
        Self {
            state: InitializationState::Uninitialized,
            correlator: Correlator::new(),
            queue: PendingQueue::new(max_pending),
            handshake: None,
            handshake_deadline: None,
            capabilities: CapabilityRuntime::new(),
            session: None,
            closed: false,
        }
    }
}

/// What `initialize()` found when it looked at the handshake.
enum HandshakeStart {
    InFlight(CallId, Instant),
    Settled,
    Closed,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.adapter.close();
        debug!(channel = %self.id, "Channel context dropped");
    }
}

impl Inner {
    fn set_state(&self, shared: &mut Shared, state: InitializationState) {
        debug!(channel = %self.id, from = shared.state.name(), to = state.name(), "State transition");
        shared.state = state.clone();
        self.state_tx.send_replace(state);
    }

    fn handle_inbound(&self, msg: InboundMessage) {
        match msg {
            InboundMessage::Response(response) => self.on_response(response),
            InboundMessage::Event(event) => {
                if self.shared.lock().closed {
                    return;
                }
                if self.dispatcher.dispatch(&event.func, &event.args) == DispatchOutcome::Dropped {
                    trace!(channel = %self.id, event = %event.func, "Event dropped");
                }
            }
            InboundMessage::Call(call) => {
                debug!(channel = %self.id, id = %call.id, func = %call.func, "Ignoring echoed call");
            }
        }
    }

    fn on_response(&self, response: HostResponse) {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;
        if shared.closed {
            return;
        }

        if shared.handshake == Some(response.id) {
            if !response.is_terminal() {
                debug!(channel = %self.id, "Ignoring partial handshake response");
                return;
            }
            shared.handshake = None;
            match response.into_outcome() {
                ResponseOutcome::Success(args) => match parse_ack(&args) {
                    Ok(ack) => self.complete_handshake(shared, ack),
                    Err(e) => self.fail_handshake_locked(shared, e),
                },
                ResponseOutcome::Failure(err) => {
                    self.fail_handshake_locked(shared, HandshakeError::Rejected(err));
                }
            }
            return;
        }

        shared.correlator.on_response(response);
    }

    fn complete_handshake(&self, shared: &mut Shared, ack: HandshakeAck) {
        info!(
            channel = %self.id,
            frame_context = %ack.session.frame_context,
            client = %ack.session.host_client_type,
            api_version = ack.session.api_version,
            legacy = ack.session.is_legacy_host,
            "Initialization complete"
        );
        shared.capabilities.install(ack.capabilities);
        shared.session = Some(ack.session);
        shared.handshake_deadline = None;
        self.set_state(shared, InitializationState::Initialized);

        let Shared {
            queue, correlator, ..
        } = shared;
        for queued in queue.drain(self.id) {
            if let Err(e) = self.adapter.send(&queued.call) {
                warn!(channel = %self.id, id = %queued.call.id, error = %e, "Queued call could not be encoded");
                correlator.reject(queued.call.id, CallError::Runtime(RuntimeError::Encode(e)));
            }
        }
    }

    fn fail_handshake_locked(&self, shared: &mut Shared, error: HandshakeError) {
        warn!(channel = %self.id, error = %error, "Initialization failed");
        shared.handshake = None;
        shared.handshake_deadline = None;
        self.set_state(shared, InitializationState::Failed(error.clone()));

        let Shared {
            queue, correlator, ..
        } = shared;
        for queued in queue.discard(self.id) {
            correlator.reject(queued.call.id, CallError::HandshakeFailed(error.clone()));
        }
    }

    /// Fails the handshake `id` if it is still the one in flight.
    fn fail_handshake(&self, id: CallId, error: HandshakeError) {
        let mut shared = self.shared.lock();
        if shared.handshake == Some(id) && matches!(shared.state, InitializationState::Initializing)
        {
            self.fail_handshake_locked(&mut shared, error);
        }
    }
}

impl ChannelContext {
    /// Starts building a context over `transport`.
    #[must_use]
    pub fn builder(transport: Arc<dyn Transport>) -> ChannelContextBuilder {
        ChannelContextBuilder::new(transport)
    }

    /// Diagnostic id of this channel.
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.inner.id
    }

    #[must_use]
    pub fn config(&self) -> &HostlinkConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn target(&self) -> TargetWindow {
        self.inner.adapter.target()
    }

    /// Origin learned from the host's first frame.
    #[must_use]
    pub fn host_origin(&self) -> Option<String> {
        self.inner.adapter.host_origin()
    }

    /// Current handshake state.
    #[must_use]
    pub fn state(&self) -> InitializationState {
        self.inner.shared.lock().state.clone()
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<InitializationState> {
        self.inner.state_tx.subscribe()
    }

    /// Number of calls awaiting a terminal response.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.inner.shared.lock().correlator.len()
    }

    /// Number of calls held until the handshake completes.
    #[must_use]
    pub fn queued_calls(&self) -> usize {
        self.inner.shared.lock().queue.len()
    }

    /// Starts the handshake and returns a future for its outcome.
    ///
    /// The first call moves the channel to `Initializing`, installs the
    /// inbound listener and posts the `initialize` call. Later calls
    /// never re-send it: they return a future for the same outcome.
    /// `valid_origins` extends the origin allow-list on every call;
    /// entries that are not `https://` origins are ignored.
    ///
    /// The handshake fails with [`HandshakeError::Timeout`] if no ack
    /// arrives within `timeouts.initialize_ms`. When a tokio runtime is
    /// available the deadline is enforced even if the returned future is
    /// never awaited.
    pub fn initialize<S: AsRef<str>>(
        &self,
        valid_origins: &[S],
    ) -> impl Future<Output = Result<(), HandshakeError>> + Send + 'static {
        if !valid_origins.is_empty() {
            self.inner.adapter.add_origins(valid_origins);
        }

        let in_flight = self.start_handshake();
        let mut state_rx = self.inner.state_tx.subscribe();
        let weak = Arc::downgrade(&self.inner);
        let after_ms = self.inner.config.timeouts.initialize_ms;

        async move {
            let (handshake_id, deadline) = match in_flight {
                HandshakeStart::InFlight(id, deadline) => (id, deadline),
                HandshakeStart::Settled => {
                    return state_rx
                        .borrow()
                        .outcome()
                        .unwrap_or(Err(HandshakeError::ChannelClosed))
                }
                HandshakeStart::Closed => return Err(HandshakeError::ChannelClosed),
            };

            loop {
                let settled = state_rx.borrow_and_update().outcome();
                if let Some(outcome) = settled {
                    return outcome;
                }
                match tokio::time::timeout_at(deadline, state_rx.changed()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => return Err(HandshakeError::ChannelClosed),
                    Err(_) => {
                        let timeout = HandshakeError::Timeout { after_ms };
                        if let Some(inner) = weak.upgrade() {
                            inner.fail_handshake(handshake_id, timeout.clone());
                        }
                        return state_rx.borrow().outcome().unwrap_or(Err(timeout));
                    }
                }
            }
        }
    }

    /// Moves `Uninitialized` to `Initializing` and posts the handshake.
    ///
    fn start_handshake(&self) -> HandshakeStart {
        let inner = &self.inner;
        let mut guard = inner.shared.lock();
        let shared = &mut *guard;

        if shared.closed {
            return HandshakeStart::Closed;
        }
        match shared.state {
            InitializationState::Initializing => {
                return match (shared.handshake, shared.handshake_deadline) {
                    (Some(id), Some(deadline)) => HandshakeStart::InFlight(id, deadline),
                    _ => HandshakeStart::Settled,
                };
            }
            InitializationState::Initialized | InitializationState::Failed(_) => {
                return HandshakeStart::Settled
            }
            InitializationState::Uninitialized => {}
        }

        let weak: Weak<Inner> = Arc::downgrade(inner);
        inner.adapter.listen(Arc::new(move |msg: InboundMessage| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_inbound(msg);
            }
        }));

        let id = shared.correlator.next_untracked_id();
        let deadline = Instant::now() + inner.config.timeouts.initialize();
        shared.handshake = Some(id);
        shared.handshake_deadline = Some(deadline);
        inner.set_state(shared, InitializationState::Initializing);

        let call = OutboundCall::new(id, INITIALIZE_FUNC, handshake_args(&inner.config.protocol));
        info!(channel = %inner.id, %id, sdk_version = %inner.config.protocol.sdk_version, "Starting initialization");
        if let Err(e) = inner.adapter.send_handshake(&call) {
            inner.fail_handshake_locked(shared, HandshakeError::Encode(e));
            return HandshakeStart::Settled;
        }
        drop(guard);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let weak = Arc::downgrade(inner);
            let after_ms = inner.config.timeouts.initialize_ms;
            handle.spawn(async move {
                tokio::time::sleep_until(deadline).await;
                if let Some(inner) = weak.upgrade() {
                    inner.fail_handshake(id, HandshakeError::Timeout { after_ms });
                }
            });
        }

        HandshakeStart::InFlight(id, deadline)
    }

    /// Submits a call and returns a future for its terminal response.
    ///
    /// While the handshake is in flight the call is queued and sent, in
    /// issue order, once it succeeds.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::NotInitialized`] if `initialize()` was never called
    /// - [`RuntimeError::HandshakeFailed`] if the handshake failed
    /// - [`RuntimeError::QueueFull`] if the pre-handshake queue is at capacity
    /// - [`RuntimeError::ChannelClosed`] after [`teardown`](Self::teardown)
    /// - [`RuntimeError::Encode`] if the call cannot be encoded
    pub fn invoke(
        &self,
        func: &str,
        args: Vec<Value>,
        tag: Option<ApiVersionTag>,
    ) -> Result<PendingCall, RuntimeError> {
        self.submit(func, args, tag, false).map(|(call, _)| call)
    }

    /// Like [`invoke`](Self::invoke), also returning a stream of every
    /// partial response the host sends before the terminal one.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub fn invoke_streaming(
        &self,
        func: &str,
        args: Vec<Value>,
        tag: Option<ApiVersionTag>,
    ) -> Result<(PendingCall, ProgressStream), RuntimeError> {
        let (call, progress) = self.submit(func, args, tag, true)?;
        match progress {
            Some(progress) => Ok((call, progress)),
            None => Err(RuntimeError::ChannelClosed),
        }
    }

    fn submit(
        &self,
        func: &str,
        args: Vec<Value>,
        tag: Option<ApiVersionTag>,
        streaming: bool,
    ) -> Result<(PendingCall, Option<ProgressStream>), RuntimeError> {
        let inner = &self.inner;
        let mut guard = inner.shared.lock();
        let shared = &mut *guard;
        let queueing = Self::check_submittable(shared)?;

        let (id, pending, progress) = if streaming {
            let (id, pending, progress) = shared.correlator.register_streaming(func);
            (id, pending, Some(progress))
        } else {
            let (id, pending) = shared.correlator.register(func);
            (id, pending, None)
        };

        let call = OutboundCall::new(id, func, args).with_tag(tag);
        if queueing {
            shared.queue.try_enqueue(call, inner.id);
        } else if let Err(e) = inner.adapter.send(&call) {
            shared.correlator.abandon(id);
            return Err(RuntimeError::Encode(e));
        }
        Ok((pending, progress))
    }

    /// Returns `true` if a submitted call must be queued.
    fn check_submittable(shared: &Shared) -> Result<bool, RuntimeError> {
        if shared.closed {
            return Err(RuntimeError::ChannelClosed);
        }
        match &shared.state {
            InitializationState::Uninitialized => Err(RuntimeError::NotInitialized),
            InitializationState::Failed(e) => Err(RuntimeError::HandshakeFailed(e.clone())),
            InitializationState::Initializing if shared.queue.is_full() => {
                Err(RuntimeError::QueueFull {
                    max: shared.queue.max_size(),
                })
            }
            InitializationState::Initializing => Ok(true),
            InitializationState::Initialized => Ok(false),
        }
    }

    /// Submits a call and awaits its result, applying `timeouts.call_ms`.
    ///
    /// On timeout the completion is abandoned; a late response is then
    /// logged and ignored.
    ///
    /// # Errors
    ///
    /// Submission errors as [`CallError::Runtime`], host rejections as
    /// [`CallError::Host`], and [`CallError::Timeout`].
    pub async fn call(
        &self,
        func: &str,
        args: Vec<Value>,
        tag: Option<ApiVersionTag>,
    ) -> CallResult {
        let pending = self.invoke(func, args, tag)?;
        self.await_with_deadline(pending).await
    }

    /// Awaits `pending`, applying `timeouts.call_ms` if configured.
    ///
    /// # Errors
    ///
    /// The call's own failure, or [`CallError::Timeout`].
    pub async fn await_with_deadline(&self, mut pending: PendingCall) -> CallResult {
        let Some(limit) = self.inner.config.timeouts.call() else {
            return pending.await;
        };
        match tokio::time::timeout(limit, &mut pending).await {
            Ok(result) => result,
            Err(_) => {
                let id = pending.id();
                self.inner.shared.lock().correlator.abandon(id);
                warn!(channel = %self.inner.id, %id, "Call timed out");
                Err(CallError::Timeout {
                    id,
                    after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Posts a call that expects no response.
    ///
    /// Uses an id from the same sequence as tracked calls; any response
    /// the host sends for it is ignored.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub fn notify(
        &self,
        func: &str,
        args: Vec<Value>,
        tag: Option<ApiVersionTag>,
    ) -> Result<(), RuntimeError> {
        let inner = &self.inner;
        let mut guard = inner.shared.lock();
        let shared = &mut *guard;
        let queueing = Self::check_submittable(shared)?;

        let id = shared.correlator.next_untracked_id();
        let call = OutboundCall::new(id, func, args).with_tag(tag);
        if queueing {
            shared.queue.try_enqueue(call, inner.id);
        } else {
            inner.adapter.send(&call)?;
        }
        Ok(())
    }

    /// Checks that the handshake succeeded and, if `allowed` is not
    /// empty, that the negotiated frame context is one of `allowed`.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::NotInitialized`] before the handshake completes
    /// - [`RuntimeError::HandshakeFailed`] after it failed
    /// - [`RuntimeError::FrameContextMismatch`] for a disallowed context
    pub fn ensure_initialized(&self, allowed: &[FrameContext]) -> Result<(), RuntimeError> {
        let shared = self.inner.shared.lock();
        if shared.closed {
            return Err(RuntimeError::ChannelClosed);
        }
        match &shared.state {
            InitializationState::Initialized => {}
            InitializationState::Failed(e) => return Err(RuntimeError::HandshakeFailed(e.clone())),
            InitializationState::Uninitialized | InitializationState::Initializing => {
                return Err(RuntimeError::NotInitialized)
            }
        }

        if allowed.is_empty() {
            return Ok(());
        }
        let Some(session) = &shared.session else {
            return Err(RuntimeError::NotInitialized);
        };
        if allowed.contains(&session.frame_context) {
            Ok(())
        } else {
            Err(RuntimeError::FrameContextMismatch {
                actual: session.frame_context.clone(),
                allowed: allowed.to_vec(),
            })
        }
    }

    /// Checks only that `initialize()` has been called.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::NotInitialized`] if it never was.
    pub fn ensure_initialize_called(&self) -> Result<(), RuntimeError> {
        let shared = self.inner.shared.lock();
        if shared.closed {
            return Err(RuntimeError::ChannelClosed);
        }
        match shared.state {
            InitializationState::Uninitialized => Err(RuntimeError::NotInitialized),
            _ => Ok(()),
        }
    }

    /// Looks up a capability path in the negotiated table.
    ///
    /// `Ok(false)` means the host did not declare it.
    ///
    /// # Errors
    ///
    /// Same as [`ensure_initialized`](Self::ensure_initialized) with no
    /// frame context restriction.
    pub fn is_supported(&self, path: &str) -> Result<bool, RuntimeError> {
        self.ensure_initialized(&[])?;
        self.inner.shared.lock().capabilities.supports(path)
    }

    /// The negotiated capability table, once the handshake succeeded.
    #[must_use]
    pub fn capabilities(&self) -> Option<Arc<CapabilityTable>> {
        self.inner.shared.lock().capabilities.table()
    }

    /// What the handshake established, once it succeeded.
    #[must_use]
    pub fn session(&self) -> Option<NegotiatedSession> {
        self.inner.shared.lock().session.clone()
    }

    /// `true` if the host runs on a phone or tablet client.
    #[must_use]
    pub fn is_host_client_mobile(&self) -> bool {
        self.inner
            .shared
            .lock()
            .session
            .as_ref()
            .is_some_and(NegotiatedSession::is_host_client_mobile)
    }

    /// `true` if the host supports at least SDK `version`.
    #[must_use]
    pub fn is_sdk_version_at_least(&self, version: &str) -> bool {
        self.inner
            .shared
            .lock()
            .session
            .as_ref()
            .is_some_and(|s| s.is_sdk_version_at_least(version))
    }

    /// Gate for APIs only mobile hosts implement.
    ///
    /// # Errors
    ///
    /// - `NotSupportedOnPlatform` on a non-mobile host
    /// - `OldPlatform` if the host's SDK is older than `required_version`
    /// - [`RuntimeError::NotInitialized`] before the handshake completes
    pub fn ensure_mobile_api_supported(&self, required_version: &str) -> Result<(), CallError> {
        self.ensure_initialized(&[])?;
        if !self.is_host_client_mobile() {
            return Err(CallError::Host(SdkError::new(
                HostErrorCode::NotSupportedOnPlatform,
            )));
        }
        if !self.is_sdk_version_at_least(required_version) {
            return Err(CallError::Host(SdkError::new(HostErrorCode::OldPlatform)));
        }
        Ok(())
    }

    /// Puts `handler` in the slot for `event`, replacing any previous one.
    ///
    /// Returns `true` if a handler was replaced. Events that arrived
    /// before registration are not replayed.
    pub fn register_handler<F>(&self, event: &str, handler: F) -> bool
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(handler);
        self.inner.dispatcher.register(event, handler)
    }

    /// Registers `handler` and tells the host to start emitting `event`.
    ///
    /// Posts `registerHandler` with `[event, ...args]` as a notification.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::NotInitialized`] if `initialize()` was never
    /// called, or any error [`notify`](Self::notify) returns.
    pub fn register_handler_with_notify<F>(
        &self,
        event: &str,
        handler: F,
        args: Vec<Value>,
    ) -> Result<bool, RuntimeError>
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.ensure_initialize_called()?;
        let replaced = self.register_handler(event, handler);
        let mut notify_args = Vec::with_capacity(args.len() + 1);
        notify_args.push(Value::String(event.to_string()));
        notify_args.extend(args);
        self.notify(REGISTER_HANDLER_FUNC, notify_args, None)?;
        Ok(replaced)
    }

    /// Empties the slot for `event`. Returns `true` if it held a handler.
    pub fn remove_handler(&self, event: &str) -> bool {
        self.inner.dispatcher.remove(event)
    }

    #[must_use]
    pub fn has_handler(&self, event: &str) -> bool {
        self.inner.dispatcher.has(event)
    }

    /// Closes the channel.
    ///
    /// Every pending and queued call resolves with
    /// [`CallError::ChannelClosed`], an in-flight handshake fails with
    /// [`HandshakeError::ChannelClosed`], handlers are cleared and the
    /// inbound listener is removed. Later submissions fail with
    /// [`RuntimeError::ChannelClosed`]. Idempotent.
    pub fn teardown(&self) {
        let inner = &self.inner;
        let rejected = {
            let mut guard = inner.shared.lock();
            let shared = &mut *guard;
            if shared.closed {
                return;
            }
            shared.closed = true;
            let rejected = shared.correlator.reject_all(&CallError::ChannelClosed);
            shared.queue.discard(inner.id);
            if matches!(shared.state, InitializationState::Initializing) {
                inner.set_state(shared, InitializationState::Failed(HandshakeError::ChannelClosed));
            }
            shared.handshake = None;
            shared.handshake_deadline = None;
            rejected
        };
        inner.dispatcher.clear();
        inner.adapter.close();
        info!(channel = %inner.id, rejected, "Channel torn down");
    }

    /// Returns the channel to its freshly built state.
    ///
    /// Pending calls are rejected with [`CallError::ChannelClosed`]; the
    /// handshake, capability table, session, queue, handlers and learned
    /// host origin are cleared. Call ids keep increasing from where they
    /// were, so a late response to a pre-reset call is never mistaken for
    /// a new one.
    pub fn reset_for_testing(&self) {
        let inner = &self.inner;
        {
            let mut guard = inner.shared.lock();
            let shared = &mut *guard;
            shared.correlator.reject_all(&CallError::ChannelClosed);
            shared.queue.discard(inner.id);
            shared.capabilities.clear();
            shared.session = None;
            shared.handshake = None;
            shared.handshake_deadline = None;
            shared.closed = false;
            inner.set_state(shared, InitializationState::Uninitialized);
        }
        inner.dispatcher.clear();
        inner.adapter.close();
        inner.adapter.reset_host_origin();
        debug!(channel = %inner.id, "Channel reset");
    }
}
