//! Core types for hostlink.
//!
//! hostlink lets a page embedded inside a host application (through an
//! iframe or webview) call capabilities the host implements and receive
//! the events the host emits, over a fire-and-forget cross-window
//! message primitive.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Protocol Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  hostlink-types   : ids, ErrorCode, frame/version  ◄── HERE │
//! │  hostlink-wire    : wire frames, SdkError, codec            │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Runtime Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  hostlink-runtime : transport, correlator, handshake,       │
//! │                     capabilities, event dispatch            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use hostlink_types::{CallIdAllocator, FrameContext, SdkVersion};
//!
//! let mut ids = CallIdAllocator::new();
//! assert_eq!(ids.next_id().get(), 0);
//! assert_eq!(ids.next_id().get(), 1);
//!
//! let ctx: FrameContext = "sidePanel".parse().unwrap();
//! assert_eq!(ctx, FrameContext::SidePanel);
//!
//! let host: SdkVersion = "2.0.5".parse().unwrap();
//! assert!(host.is_at_least(&"2.0.1".parse().unwrap()));
//! ```

mod error;
mod frame;
mod id;
mod version;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use frame::{FrameContext, HostClientType};
pub use id::{CallId, CallIdAllocator, ChannelId};
pub use version::{
    compare_sdk_versions, ApiVersionTag, SdkVersion, VersionParseError, DEFAULT_HOST_SDK_VERSION,
};
