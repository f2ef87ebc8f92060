//! In-memory host for tests.
//!
//! [`MockHost`] implements [`Transport`]: it records every posted frame
//! and lets the test deliver responses, events and handshake acks back
//! to the channel. Delivery only happens when the test asks for it,
//! never from inside `post`.

use crate::error::TransportError;
use crate::handshake::INITIALIZE_FUNC;
use crate::transport::{InboundSink, RawInbound, TargetWindow, Transport};
use hostlink_types::CallId;
use hostlink_wire::{encode_event, encode_response, HostEvent, HostResponse, SdkError};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// One frame the channel posted.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedFrame {
    pub target: TargetWindow,
    /// Target origin the frame was restricted to (`*` for any).
    pub origin: String,
    pub payload: Value,
}

impl PostedFrame {
    /// `func` of the posted call, if present.
    #[must_use]
    pub fn func(&self) -> Option<&str> {
        self.payload.get("func").and_then(Value::as_str)
    }

    /// `id` of the posted call, if present.
    #[must_use]
    pub fn id(&self) -> Option<CallId> {
        self.payload.get("id").and_then(Value::as_u64).map(CallId::new)
    }
}

/// Scriptable host window.
pub struct MockHost {
    origin: Option<String>,
    posted: Mutex<Vec<PostedFrame>>,
    sink: Mutex<Option<InboundSink>>,
    detached: Mutex<bool>,
}

impl std::fmt::Debug for MockHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHost")
            .field("origin", &self.origin)
            .field("posted", &self.posted.lock().len())
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

impl MockHost {
    /// Host served from `origin`. Frames are delivered as coming from
    /// the parent window.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            origin: Some(origin.into()),
            posted: Mutex::new(Vec::new()),
            sink: Mutex::new(None),
            detached: Mutex::new(false),
        })
    }

    /// Host reached through a native bridge. Frames carry no origin.
    #[must_use]
    pub fn native() -> Arc<Self> {
        Arc::new(Self {
            origin: None,
            posted: Mutex::new(Vec::new()),
            sink: Mutex::new(None),
            detached: Mutex::new(false),
        })
    }

    /// Every frame posted so far, oldest first.
    #[must_use]
    pub fn posted(&self) -> Vec<PostedFrame> {
        self.posted.lock().clone()
    }

    /// `func` of every posted frame, oldest first.
    #[must_use]
    pub fn posted_funcs(&self) -> Vec<String> {
        self.posted
            .lock()
            .iter()
            .filter_map(|f| f.func().map(str::to_string))
            .collect()
    }

    /// Id of the posted frame calling `func`, most recent first.
    #[must_use]
    pub fn id_of(&self, func: &str) -> Option<CallId> {
        self.posted
            .lock()
            .iter()
            .rev()
            .find(|f| f.func() == Some(func))
            .and_then(PostedFrame::id)
    }

    /// Id of the most recent handshake call.
    #[must_use]
    pub fn handshake_id(&self) -> Option<CallId> {
        self.id_of(INITIALIZE_FUNC)
    }

    /// Forgets recorded frames.
    pub fn clear_posted(&self) {
        self.posted.lock().clear();
    }

    /// `true` while the channel has a listener installed.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.sink.lock().is_some()
    }

    /// Makes every later `post` fail as if the window had closed.
    pub fn detach(&self) {
        *self.detached.lock() = true;
    }

    /// Hands a raw frame to the channel's listener.
    ///
    /// Returns `false` if no listener is installed.
    pub fn deliver(&self, raw: RawInbound) -> bool {
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => {
                sink(raw);
                true
            }
            None => {
                trace!("No listener, frame not delivered");
                false
            }
        }
    }

    /// Delivers `data` as coming from this host.
    pub fn deliver_frame(&self, data: Value) -> bool {
        let raw = match &self.origin {
            Some(origin) => RawInbound::from_parent(origin.clone(), data),
            None => RawInbound::from_native(data),
        };
        self.deliver(raw)
    }

    fn deliver_response(&self, response: &HostResponse) -> bool {
        match encode_response(response) {
            Ok(frame) => self.deliver_frame(frame),
            Err(_) => false,
        }
    }

    /// Terminal success response.
    pub fn respond(&self, id: CallId, args: Vec<Value>) -> bool {
        self.deliver_response(&HostResponse::success(id, args))
    }

    /// Partial (streaming) response.
    pub fn respond_partial(&self, id: CallId, args: Vec<Value>) -> bool {
        self.deliver_response(&HostResponse::partial(id, args))
    }

    /// Terminal error response.
    pub fn reject(&self, id: CallId, error: &SdkError) -> bool {
        self.deliver_response(&HostResponse::failure(id, error))
    }

    /// Acknowledges the handshake with `runtime_config` serialized as
    /// JSON text in the third slot.
    pub fn ack_handshake(&self, frame_context: &str, client_type: &str, runtime_config: Value) -> bool {
        self.ack_handshake_raw(vec![
            Value::String(frame_context.to_string()),
            Value::String(client_type.to_string()),
            Value::String(runtime_config.to_string()),
        ])
    }

    /// Acknowledges the handshake with arbitrary response args.
    pub fn ack_handshake_raw(&self, args: Vec<Value>) -> bool {
        match self.handshake_id() {
            Some(id) => self.respond(id, args),
            None => false,
        }
    }

    /// Host-initiated event.
    pub fn emit_event(&self, name: &str, args: Vec<Value>) -> bool {
        match encode_event(&HostEvent::new(name, args)) {
            Ok(frame) => self.deliver_frame(frame),
            Err(_) => false,
        }
    }
}

impl Transport for MockHost {
    fn post(
        &self,
        target: TargetWindow,
        target_origin: &str,
        payload: Value,
    ) -> Result<(), TransportError> {
        if *self.detached.lock() {
            return Err(TransportError::Detached);
        }
        self.posted.lock().push(PostedFrame {
            target,
            origin: target_origin.to_string(),
            payload,
        });
        Ok(())
    }

    fn listen(&self, sink: InboundSink) {
        *self.sink.lock() = Some(sink);
    }

    fn unlisten(&self) {
        *self.sink.lock() = None;
    }
}
