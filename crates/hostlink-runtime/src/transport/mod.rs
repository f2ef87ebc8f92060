//! Cross-window transport.
//!
//! The only primitive available across the embedding boundary is a
//! fire-and-forget "post a message to that window" call plus an inbound
//! listener. [`Transport`] abstracts that primitive; [`TransportAdapter`]
//! adds framing, origin filtering and target-origin tracking on top.
//!
//! ```text
//!   ChannelContext ──send──► TransportAdapter ──post──► dyn Transport ──► host
//!         ▲                        │
//!         └──InboundMessage── accept() ◄──RawInbound── dyn Transport ◄── host
//!                          (origin check, decode)
//! ```

mod adapter;
mod origin;

pub use adapter::TransportAdapter;
pub use origin::{host_matches_pattern, OriginPolicy};

use crate::error::TransportError;
use serde_json::Value;
use std::sync::Arc;

/// Window an outbound frame is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetWindow {
    /// The embedding parent frame.
    Parent,
    /// The window that opened this one (authentication popups).
    Opener,
    /// A native bridge exposed by a frameless host. No origin applies.
    Native,
}

/// Where an inbound frame came from, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSource {
    Parent,
    Opener,
    /// The page's own window (a frame it posted to itself).
    OwnWindow,
    /// The native bridge of a frameless host.
    Native,
    /// Any other window.
    Other,
}

/// An inbound frame before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInbound {
    pub source: MessageSource,
    /// Sender origin. `None` for the native bridge.
    pub origin: Option<String>,
    pub data: Value,
}

impl RawInbound {
    /// Frame from the parent window.
    #[must_use]
    pub fn from_parent(origin: impl Into<String>, data: Value) -> Self {
        Self {
            source: MessageSource::Parent,
            origin: Some(origin.into()),
            data,
        }
    }

    /// Frame from the native bridge.
    #[must_use]
    pub fn from_native(data: Value) -> Self {
        Self {
            source: MessageSource::Native,
            origin: None,
            data,
        }
    }
}

/// Callback the transport invokes for every inbound frame.
pub type InboundSink = Arc<dyn Fn(RawInbound) + Send + Sync>;

/// The raw cross-window message primitive.
///
/// Implementations must not block. `post` on a closed or missing target
/// returns [`TransportError::Detached`]; the adapter logs it and drops
/// the frame.
///
/// Neither `post` nor `listen` may invoke the inbound sink
/// synchronously. Both are called while the channel state lock is held,
/// and the sink takes the same lock.
pub trait Transport: Send + Sync {
    /// Posts `payload` to `target`. `target_origin` restricts delivery to
    /// a window with that origin (`*` for any) and is ignored for
    /// [`TargetWindow::Native`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the frame could not be posted.
    fn post(
        &self,
        target: TargetWindow,
        target_origin: &str,
        payload: Value,
    ) -> Result<(), TransportError>;

    /// Installs the single inbound listener, replacing any previous one.
    fn listen(&self, sink: InboundSink);

    /// Removes the inbound listener.
    fn unlisten(&self);
}
