//! Identifier types for hostlink.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one outbound call on a channel.
///
/// Call ids are the correlation key between a call posted to the host
/// and the response(s) the host posts back. They are plain integers on
/// the wire and are allocated by a [`CallIdAllocator`], which hands them
/// out strictly increasing and never reuses one for the lifetime of the
/// channel.
///
/// # Example
///
/// ```
/// use hostlink_types::CallId;
///
/// let id = CallId::new(7);
/// assert_eq!(id.get(), 7);
/// assert_eq!(id.to_string(), "call:7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(u64);

impl CallId {
    /// Wraps a raw wire id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw wire id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call:{}", self.0)
    }
}

impl From<u64> for CallId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Monotonic [`CallId`] source for a single channel.
///
/// The first id handed out is `0`. There is deliberately no way to
/// rewind the counter: a reset of handshake state keeps allocating from
/// where it left off so a late response for an abandoned call can never
/// be mistaken for a response to a new one.
///
/// # Example
///
/// ```
/// use hostlink_types::CallIdAllocator;
///
/// let mut ids = CallIdAllocator::new();
/// let a = ids.next_id();
/// let b = ids.next_id();
/// assert!(b > a);
/// assert_eq!(ids.issued(), 2);
/// ```
#[derive(Debug, Default)]
pub struct CallIdAllocator {
    next: u64,
}

impl CallIdAllocator {
    /// Creates an allocator starting at id `0`.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocates the next id.
    pub fn next_id(&mut self) -> CallId {
        let id = CallId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids issued so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Identifier of a channel context instance.
///
/// Used only for diagnostics: every log line emitted by a channel
/// carries it so that several independent channels (or tests) running
/// in one process can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub Uuid);

#[allow(clippy::new_without_default)] // a default id would look registered when it is not
impl ChannelId {
    /// Creates a new [`ChannelId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch:{}", self.0)
    }
}
