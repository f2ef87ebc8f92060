//! Framing and filtering over a [`Transport`].

use super::{InboundSink, MessageSource, OriginPolicy, RawInbound, TargetWindow, Transport};
use hostlink_wire::{decode, encode, InboundMessage, OutboundCall, WireError};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Target origin used before the host origin is known.
const ANY_ORIGIN: &str = "*";

/// Wraps a [`Transport`] with encoding, origin filtering and decoding.
///
/// The host origin is learned from the first trusted frame received from
/// the target window; every later post is restricted to that origin.
pub struct TransportAdapter {
    transport: Arc<dyn Transport>,
    target: TargetWindow,
    policy: RwLock<OriginPolicy>,
    host_origin: Mutex<Option<String>>,
}

impl std::fmt::Debug for TransportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportAdapter")
            .field("target", &self.target)
            .field("host_origin", &*self.host_origin.lock())
            .finish_non_exhaustive()
    }
}

impl TransportAdapter {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, target: TargetWindow, policy: OriginPolicy) -> Self {
        Self {
            transport,
            target,
            policy: RwLock::new(policy),
            host_origin: Mutex::new(None),
        }
    }

    /// Window this adapter posts to.
    #[must_use]
    pub fn target(&self) -> TargetWindow {
        self.target
    }

    /// Origin learned from the host, if any frame has been accepted yet.
    #[must_use]
    pub fn host_origin(&self) -> Option<String> {
        self.host_origin.lock().clone()
    }

    /// Extends the origin allow-list. Returns how many patterns were added.
    pub fn add_origins<S: AsRef<str>>(&self, origins: &[S]) -> usize {
        self.policy.write().add_origins(origins)
    }

    /// Posts a call to the host.
    ///
    /// A closed target or an unknown host origin drops the frame with a
    /// warning; the caller's pending completion stays registered.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] only if the call cannot be encoded.
    pub fn send(&self, call: &OutboundCall) -> Result<(), WireError> {
        let origin = match self.target {
            TargetWindow::Native => ANY_ORIGIN.to_string(),
            _ => match self.host_origin() {
                Some(origin) => origin,
                None => {
                    warn!(id = %call.id, func = %call.func, "Host origin unknown, dropping frame");
                    return Ok(());
                }
            },
        };
        self.post(&origin, call)
    }

    /// Posts the handshake call to any origin.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] only if the call cannot be encoded.
    pub fn send_handshake(&self, call: &OutboundCall) -> Result<(), WireError> {
        self.post(ANY_ORIGIN, call)
    }

    fn post(&self, origin: &str, call: &OutboundCall) -> Result<(), WireError> {
        let payload = encode(call)?;
        match self.transport.post(self.target, origin, payload) {
            Ok(()) => trace!(id = %call.id, func = %call.func, origin, "Posted frame"),
            Err(e) => warn!(id = %call.id, func = %call.func, error = %e, "Post failed, dropping frame"),
        }
        Ok(())
    }

    /// Validates and decodes one inbound frame.
    ///
    /// Returns `None` for frames from the page's own window, from an
    /// untrusted origin, from any window other than the target, or that
    /// fail to decode.
    pub fn accept(&self, raw: RawInbound) -> Option<InboundMessage> {
        match raw.source {
            MessageSource::OwnWindow => {
                trace!("Ignoring frame from own window");
                return None;
            }
            MessageSource::Native => {}
            source => {
                let Some(origin) = raw.origin.as_deref() else {
                    debug!(?source, "Dropping frame without origin");
                    return None;
                };
                if !self.policy.read().is_trusted(origin) {
                    debug!(?source, origin, "Dropping frame from untrusted origin");
                    return None;
                }
                if !source_matches_target(source, self.target) {
                    debug!(?source, origin, target = ?self.target, "Dropping frame from non-target window");
                    return None;
                }
                let mut host_origin = self.host_origin.lock();
                if host_origin.is_none() {
                    debug!(origin, "Learned host origin");
                    *host_origin = Some(origin.to_string());
                }
            }
        }

        match decode(&raw.data) {
            Ok(msg) => Some(msg),
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
                None
            }
        }
    }

    /// Installs the inbound listener on the transport.
    ///
    /// Frames that pass [`accept`](Self::accept) are handed to `handler`.
    /// The listener holds only a weak reference to the adapter.
    pub fn listen(self: &Arc<Self>, handler: Arc<dyn Fn(InboundMessage) + Send + Sync>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let sink: InboundSink = Arc::new(move |raw: RawInbound| {
            let Some(adapter) = weak.upgrade() else {
                return;
            };
            if let Some(msg) = adapter.accept(raw) {
                handler(msg);
            }
        });
        self.transport.listen(sink);
    }

    /// Removes the inbound listener.
    pub fn close(&self) {
        self.transport.unlisten();
    }

    /// Forgets the learned host origin.
    pub fn reset_host_origin(&self) {
        *self.host_origin.lock() = None;
    }
}

fn source_matches_target(source: MessageSource, target: TargetWindow) -> bool {
    matches!(
        (source, target),
        (MessageSource::Parent, TargetWindow::Parent) | (MessageSource::Opener, TargetWindow::Opener)
    )
}
