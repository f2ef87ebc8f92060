//! Pre-handshake message queue.
//!
//! Calls made while the handshake is in flight are held here and
//! flushed strictly in enqueue order once it succeeds. If the handshake
//! fails they are discarded and their completions rejected by the
//! caller of [`PendingQueue::discard`].

use hostlink_types::CallId;
use hostlink_wire::OutboundCall;
use std::collections::VecDeque;
use std::fmt::Display;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default maximum number of queued calls.
pub const PENDING_QUEUE_MAX_SIZE: usize = 256;

/// A call waiting for the handshake.
///
/// The completion itself stays in the correlator under `call.id`.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub call: OutboundCall,
    pub queued_at: Instant,
}

impl QueuedMessage {
    #[must_use]
    pub fn id(&self) -> CallId {
        self.call.id
    }
}

/// FIFO of calls submitted during `Initializing`.
#[derive(Debug)]
pub struct PendingQueue {
    queue: VecDeque<QueuedMessage>,
    max_size: usize,
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new(PENDING_QUEUE_MAX_SIZE)
    }
}

impl PendingQueue {
    /// Creates an empty queue holding at most `max_size` calls.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max_size,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.max_size
    }

    /// Attempts to enqueue a call.
    ///
    /// Returns `true` if the call was queued, `false` if the queue is full.
    pub fn try_enqueue(&mut self, call: OutboundCall, channel: impl Display) -> bool {
        if self.is_full() {
            warn!(
                %channel,
                id = %call.id,
                max = self.max_size,
                "Pending queue full, refusing call"
            );
            return false;
        }

        debug!(
            %channel,
            id = %call.id,
            func = %call.func,
            queue_size = self.queue.len() + 1,
            "Queuing call until initialization completes"
        );
        self.queue.push_back(QueuedMessage {
            call,
            queued_at: Instant::now(),
        });
        true
    }

    /// Drains all queued calls in enqueue order.
    pub fn drain(&mut self, channel: impl Display) -> impl Iterator<Item = QueuedMessage> + '_ {
        let count = self.queue.len();
        if count > 0 {
            info!(%channel, count, "Flushing queued calls after initialization");
        }
        self.queue.drain(..)
    }

    /// Removes every queued call without sending it.
    ///
    /// The caller rejects the returned calls' completions.
    pub fn discard(&mut self, channel: impl Display) -> Vec<QueuedMessage> {
        let discarded: Vec<_> = self.queue.drain(..).collect();
        if !discarded.is_empty() {
            warn!(%channel, count = discarded.len(), "Discarding queued calls");
        }
        discarded
    }
}
