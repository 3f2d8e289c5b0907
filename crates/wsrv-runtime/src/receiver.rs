#![forbid(unsafe_code)]

//! Message receivers and the id registry that addresses them.
//!
//! Posters never hold a receiver directly. They hold a [`ReceiverId`], a
//! plain number that can cross threads (or an IPC boundary). The registry
//! maps ids to weak references; the receiver's owner keeps the only strong
//! reference and decides its lifetime.
//!
//! Resolution distinguishes two failure cases:
//! - an id that was never issued (including [`ReceiverId::NULL`]) is a
//!   programming error and fatal to the loop;
//! - an id that was issued but whose receiver has since been unregistered or
//!   dropped is retired, and messages to it are discarded.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use wsrv_core::event::Message;

/// Something that can handle a delivered message.
///
/// `handle` runs synchronously on the loop thread. A slow implementation
/// delays every message queued behind it. Implementations may post further
/// messages or register receivers from inside `handle`.
pub trait Receiver: Send + Sync {
    /// Consume one message.
    fn handle(&self, message: Message);
}

/// Non-owning address of a registered [`Receiver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReceiverId(u64);

impl ReceiverId {
    /// The null address. Never resolves.
    pub const NULL: Self = Self(0);

    /// Rebuild an id from its raw number (e.g. received over IPC).
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw number.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Check for the null address.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of looking up a [`ReceiverId`].
pub enum Resolution {
    /// The receiver is alive; the strong reference lasts for one dispatch.
    Live(Arc<dyn Receiver>),
    /// The id was issued but its receiver is gone.
    Retired,
    /// The id was never issued.
    Unknown,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(_) => f.write_str("Live"),
            Self::Retired => f.write_str("Retired"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Maps ids to weakly held receivers.
#[derive(Debug)]
pub struct ReceiverRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<ReceiverId, Weak<dyn Receiver>>>,
}

impl Default for ReceiverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiverRegistry {
    /// Create an empty registry. The first issued id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register a receiver and return its address.
    ///
    /// Only a weak reference is kept: dropping the last `Arc` retires the id.
    pub fn register<R: Receiver + 'static>(&self, receiver: &Arc<R>) -> ReceiverId {
        let id = ReceiverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let weak: Weak<R> = Arc::downgrade(receiver);
        let weak: Weak<dyn Receiver> = weak;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, weak);
        tracing::debug!(receiver = %id, "registered receiver");
        id
    }

    /// Retire an id. Returns `false` if it was not registered.
    pub fn unregister(&self, id: ReceiverId) -> bool {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some();
        if removed {
            tracing::debug!(receiver = %id, "unregistered receiver");
        }
        removed
    }

    /// Look up a receiver.
    ///
    /// The registry lock is released before returning, so the caller may
    /// invoke the receiver without blocking concurrent registration.
    pub fn resolve(&self, id: ReceiverId) -> Resolution {
        if id.is_null() || id.0 >= self.next_id.load(Ordering::Relaxed) {
            return Resolution::Unknown;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(&id).map(Weak::upgrade) {
            Some(Some(receiver)) => Resolution::Live(receiver),
            Some(None) => {
                entries.remove(&id);
                Resolution::Retired
            }
            None => Resolution::Retired,
        }
    }

    /// Number of registered ids whose receiver is still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}
