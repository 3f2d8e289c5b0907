#![forbid(unsafe_code)]

//! Pending-message queue with region coalescing.
//!
//! During a resize or a drag the window manager can invalidate the same
//! window dozens of times before the loop gets to dispatch. Without
//! coalescing every one of those would become a separate repaint.
//!
//! # Coalescing Rules
//!
//! - **Invalidate**: dropped if an Invalidate for the same receiver is already
//!   pending and its region is empty (whole surface) or contains the new one.
//! - **Paint**: the same rule, checked only against pending Paints.
//! - **Everything else**: always appended.
//!
//! The rule is one-directional. A new region that covers a
//! pending one does not replace it, and overlapping regions are not merged;
//! both entries stay queued and are delivered separately, in order.
//!
//! # Thread Safety
//!
//! All access goes through one mutex. [`MessageQueue::enqueue`] holds it for
//! the scan and append; [`MessageQueue::drain_all`] holds it only to swap the
//! vector out, so producers never wait on dispatch.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use wsrv_core::event::Message;

use crate::receiver::ReceiverId;

/// One pending delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    /// Target of the message.
    pub receiver: ReceiverId,
    /// The message itself.
    pub message: Message,
}

/// What [`MessageQueue::enqueue`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Appended to the queue.
    Queued,
    /// Dropped because a pending message already covers it.
    Coalesced,
}

/// Insertion-ordered queue of `(receiver, message)` pairs.
#[derive(Debug, Default)]
pub struct MessageQueue {
    entries: Mutex<Vec<QueuedMessage>>,
    coalesced: AtomicU64,
}

impl MessageQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, unless coalescing drops it.
    pub fn enqueue(&self, receiver: ReceiverId, message: Message) -> Enqueued {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let kind = message.kind();
        if let Some(region) = message.region().filter(|_| kind.is_region_coalescable()) {
            let covered = entries.iter().any(|queued| {
                queued.receiver == receiver
                    && queued.message.kind() == kind
                    && queued
                        .message
                        .region()
                        .is_some_and(|pending| pending.contains_rect(&region))
            });
            if covered {
                drop(entries);
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    receiver = %receiver,
                    kind = kind.name(),
                    ?region,
                    "swallowed covered message"
                );
                return Enqueued::Coalesced;
            }
        }

        entries.push(QueuedMessage { receiver, message });
        Enqueued::Queued
    }

    /// Detach every pending entry in insertion order, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<QueuedMessage> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Drop all pending entries addressed to `receiver`. Returns how many.
    pub fn purge(&self, receiver: ReceiverId) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|queued| queued.receiver != receiver);
        before - entries.len()
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Total messages dropped by coalescing since creation.
    #[must_use]
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}
