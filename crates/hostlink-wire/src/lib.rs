//! Wire frames and codec for hostlink.
//!
//! This crate defines what crosses the window boundary between an
//! embedded page and its host, and nothing else: no state, no I/O.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Protocol Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  hostlink-types   : ids, ErrorCode, frame/version           │
//! │  hostlink-wire    : wire frames, SdkError, codec  ◄── HERE  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Wire Shapes
//!
//! ```text
//! page → host   { id, func, args, apiVersionTag? }
//! host → page   { id, args?, isPartialResponse? }     response
//! host → page   { func, args? }                       event
//! ```
//!
//! A response whose first arg is `{ errorCode: <int>, message? }` is a
//! host rejection; see [`HostResponse::error`].
//!
//! # Example
//!
//! ```
//! use hostlink_types::CallId;
//! use hostlink_wire::{decode, encode, InboundMessage, OutboundCall};
//! use serde_json::json;
//!
//! let call = OutboundCall::new(CallId::new(7), "getContext", vec![]);
//! let payload = encode(&call).unwrap();
//! assert_eq!(payload["func"], "getContext");
//!
//! // The same frame coming back in is an echo, not a response.
//! assert_eq!(decode(&payload).unwrap(), InboundMessage::Call(call));
//! ```

mod codec;
mod error;
mod frame;
mod sdk_error;

pub use codec::{decode, decode_str, encode, encode_event, encode_response};
pub use error::WireError;
pub use frame::{HostEvent, HostResponse, InboundMessage, OutboundCall, ResponseOutcome};
pub use sdk_error::{HostErrorCode, SdkError};
