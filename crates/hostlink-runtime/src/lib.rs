//! hostlink runtime: correlation, handshake and capabilities.
//!
//! This crate turns a fire-and-forget cross-window message primitive
//! into resolvable asynchronous calls between an embedded page and the
//! host application that embeds it.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Protocol Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  hostlink-types   : ids, ErrorCode, frame/version           │
//! │  hostlink-wire    : wire frames, SdkError, codec            │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Runtime Layer (THIS CRATE)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  transport/  : Transport trait, origin policy, adapter      │
//! │  correlator  : call ids, pending completions                │
//! │  queue       : pre-handshake FIFO                           │
//! │  handshake   : InitializationState, ack parsing             │
//! │  capability  : negotiated capability table                  │
//! │  dispatcher  : single-slot event handlers                   │
//! │  context     : ChannelContext tying the above together      │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Capability wrappers                         │
//! │  (outside this workspace: call invoke() / is_supported())   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! ## [`context`] - Channel Context
//!
//! - [`ChannelContext`]: one page ↔ host channel, explicit rather than global
//! - [`ChannelContextBuilder`]: transport, target window, config
//!
//! ## [`transport`] - Cross-Window Transport
//!
//! - [`Transport`]: the raw post/listen primitive, implemented by the embedder
//! - [`OriginPolicy`]: which inbound origins are trusted
//! - [`TransportAdapter`]: encode, filter, decode
//!
//! ## [`config`] - Configuration
//!
//! - [`HostlinkConfig`]: origins, timeouts, queue and protocol settings
//! - [`ConfigLoader`]: defaults, then TOML files, then `HOSTLINK_*` env vars
//!
//! ## [`compat`] / [`helpers`]
//!
//! Callback-style entry points and typed response unwrapping, both built
//! only on the public future-based API.
//!
//! ## [`testing`]
//!
//! [`MockHost`](testing::MockHost), an in-memory [`Transport`] for tests.
//!
//! # Logging
//!
//! Everything is logged through `tracing`. Dropped frames (untrusted
//! origin, malformed payload, unknown id, event without a handler) are
//! logged at `debug` or `warn` and never surface as errors. The crate
//! never installs a subscriber.

pub mod capability;
pub mod compat;
pub mod config;
pub mod context;
pub mod correlator;
pub mod dispatcher;
pub mod error;
pub mod handshake;
pub mod helpers;
pub mod queue;
pub mod testing;
pub mod transport;

pub use capability::{CapabilityRuntime, CapabilityTable};
pub use config::{
    ConfigError, ConfigLoader, HostlinkConfig, OriginsConfig, ProtocolConfig, QueueConfig,
    TimeoutsConfig, DEFAULT_TRUSTED_HOSTS,
};
pub use context::{ChannelContext, ChannelContextBuilder};
pub use correlator::{CallResult, Correlator, PendingCall, PendingCompletion, ProgressStream, Resolution};
pub use dispatcher::{events, DispatchOutcome, EventDispatcher, EventHandler};
pub use error::{CallError, HandshakeError, RuntimeError, TransportError, NOT_INITIALIZED_MESSAGE};
pub use handshake::{InitializationState, NegotiatedSession};
pub use queue::{PendingQueue, QueuedMessage, PENDING_QUEUE_MAX_SIZE};
pub use transport::{
    host_matches_pattern, InboundSink, MessageSource, OriginPolicy, RawInbound, TargetWindow,
    Transport, TransportAdapter,
};

// Wire vocabulary callers need to name results and errors.
pub use hostlink_types::{ApiVersionTag, CallId, FrameContext, HostClientType};
pub use hostlink_wire::{HostErrorCode, SdkError};
