#![forbid(unsafe_code)]

//! Process-wide loop context.
//!
//! One [`LoopContext`] is created at startup and shared as
//! `Arc<LoopContext>` with every component that posts messages or owns
//! receivers. It bundles the state that producers and the loop thread both
//! touch: the pending queue, the receiver registry, and the wake pipe.
//! Device handles are not here; only the loop thread holds those.

use std::io;
use std::os::fd::BorrowedFd;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use wsrv_core::event::Message;

use crate::message_queue::{Enqueued, MessageQueue, QueuedMessage};
use crate::receiver::{Receiver, ReceiverId, ReceiverRegistry, Resolution};
use crate::wake::{Readiness, WaitTimeout, WakePipe};

/// Counters describing loop activity since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Completed loop cycles.
    pub cycles: u64,
    /// Messages accepted into the queue.
    pub posted: u64,
    /// Messages dropped by coalescing.
    pub coalesced: u64,
    /// Messages delivered to a live receiver.
    pub dispatched: u64,
    /// Messages discarded because their receiver was retired.
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    cycles: AtomicU64,
    posted: AtomicU64,
    dispatched: AtomicU64,
    skipped: AtomicU64,
}

/// Shared state of one message loop.
#[derive(Debug)]
pub struct LoopContext {
    queue: MessageQueue,
    receivers: ReceiverRegistry,
    wake: WakePipe,
    loop_thread: OnceLock<ThreadId>,
    running: AtomicBool,
    counters: StatCounters,
}

impl LoopContext {
    /// Create the context.
    ///
    /// Fails only if the wake pipe cannot be created.
    pub fn new() -> io::Result<Arc<Self>> {
        Ok(Arc::new(Self {
            queue: MessageQueue::new(),
            receivers: ReceiverRegistry::new(),
            wake: WakePipe::new()?,
            loop_thread: OnceLock::new(),
            running: AtomicBool::new(false),
            counters: StatCounters::default(),
        }))
    }

    /// Queue a message for `receiver`. Callable from any thread.
    ///
    /// Wakes the loop when called from another thread and the message was
    /// queued.
    pub fn post(&self, receiver: ReceiverId, message: Message) -> Enqueued {
        tracing::trace!(receiver = %receiver, kind = message.name(), "post");
        let outcome = self.queue.enqueue(receiver, message);
        if outcome == Enqueued::Queued {
            self.counters.posted.fetch_add(1, Ordering::Relaxed);
            self.request_wake();
        }
        outcome
    }

    /// Register a receiver. The context keeps only a weak reference.
    pub fn register<R: Receiver + 'static>(&self, receiver: &Arc<R>) -> ReceiverId {
        self.receivers.register(receiver)
    }

    /// Retire a receiver and discard its pending messages.
    ///
    /// Messages already detached for the current dispatch batch are skipped
    /// at delivery time instead.
    pub fn unregister(&self, receiver: ReceiverId) -> bool {
        let removed = self.receivers.unregister(receiver);
        if removed {
            let purged = self.queue.purge(receiver);
            if purged > 0 {
                tracing::debug!(receiver = %receiver, purged, "discarded pending messages");
            }
        }
        removed
    }

    /// Make a blocked [`LoopContext::wait`] return. No-op on the loop thread.
    pub fn request_wake(&self) {
        if self.is_loop_thread() {
            return;
        }
        if let Err(err) = self.wake.notify() {
            tracing::warn!(error = %err, "failed to wake message loop");
        }
    }

    /// Block until a handle is readable or a wake arrives.
    ///
    /// Returns at once, without blocking, while messages are pending.
    pub fn wait(&self, handles: &[BorrowedFd<'_>]) -> io::Result<Readiness> {
        let timeout = if self.queue.is_empty() {
            WaitTimeout::Forever
        } else {
            WaitTimeout::Immediate
        };
        self.wake.wait(handles, timeout)
    }

    /// Number of messages waiting for dispatch.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether a loop has started running on this context.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the caller is the loop thread.
    #[must_use]
    pub fn is_loop_thread(&self) -> bool {
        self.loop_thread
            .get()
            .is_some_and(|id| *id == thread::current().id())
    }

    /// Snapshot of the activity counters.
    #[must_use]
    pub fn stats(&self) -> LoopStats {
        LoopStats {
            cycles: self.counters.cycles.load(Ordering::Relaxed),
            posted: self.counters.posted.load(Ordering::Relaxed),
            coalesced: self.queue.coalesced_count(),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
        }
    }

    /// Claim the calling thread as the loop thread.
    ///
    /// Returns `false` if a different thread already claimed it.
    pub(crate) fn enter_loop(&self) -> bool {
        let current = thread::current().id();
        let owner = *self.loop_thread.get_or_init(|| current);
        if owner == current && !self.running.swap(true, Ordering::AcqRel) {
            tracing::info!("message loop running");
        }
        owner == current
    }

    pub(crate) fn take_batch(&self) -> Vec<QueuedMessage> {
        self.queue.drain_all()
    }

    pub(crate) fn resolve(&self, receiver: ReceiverId) -> Resolution {
        self.receivers.resolve(receiver)
    }

    pub(crate) fn record_cycle(&self, dispatched: usize, skipped: usize) {
        self.counters.cycles.fetch_add(1, Ordering::Relaxed);
        self.counters
            .dispatched
            .fetch_add(dispatched as u64, Ordering::Relaxed);
        self.counters
            .skipped
            .fetch_add(skipped as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsFd;
    use std::os::unix::net::UnixStream;
    use std::time::{Duration, Instant};
    use wsrv_core::event::KeyEvent;
    use wsrv_core::geometry::Rect;

    struct Sink;

    impl Receiver for Sink {
        fn handle(&self, _message: Message) {}
    }

    #[test]
    fn wait_returns_immediately_when_queue_non_empty() {
        let ctx = LoopContext::new().unwrap();
        let (device, _peer) = UnixStream::pair().unwrap();
        ctx.post(ReceiverId::from_raw(1), Message::Key(KeyEvent::new(1)));

        let start = Instant::now();
        let readiness = ctx.wait(&[device.as_fd()]).unwrap();
        assert!(!readiness.any_ready());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn cross_thread_post_wakes_blocked_wait() {
        let ctx = LoopContext::new().unwrap();
        assert!(ctx.enter_loop());
        let (device, _peer) = UnixStream::pair().unwrap();

        let producer = {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                ctx.post(ReceiverId::from_raw(1), Message::Paint(Rect::whole_surface()));
            })
        };

        let readiness = ctx.wait(&[device.as_fd()]).unwrap();
        assert!(readiness.woken());
        producer.join().unwrap();
        assert_eq!(ctx.pending(), 1);
    }

    #[test]
    fn wake_request_on_loop_thread_is_noop() {
        let ctx = LoopContext::new().unwrap();
        assert!(ctx.enter_loop());
        ctx.request_wake();
        let (device, _peer) = UnixStream::pair().unwrap();
        // Queue is empty, so a pending wake byte would be the only thing
        // ending this wait; check with a zero-timeout wait on the pipe.
        let readiness = ctx.wake.wait(&[device.as_fd()], WaitTimeout::Immediate).unwrap();
        assert!(!readiness.woken());
    }

    #[test]
    fn wake_request_off_loop_thread_signals() {
        let ctx = LoopContext::new().unwrap();
        let remote = Arc::clone(&ctx);
        thread::spawn(move || assert!(remote.enter_loop()))
            .join()
            .unwrap();
        assert!(!ctx.is_loop_thread());
        ctx.request_wake();
        let readiness = ctx.wake.wait(&[], WaitTimeout::Immediate).unwrap();
        assert!(readiness.woken());
    }

    #[test]
    fn second_thread_cannot_claim_loop() {
        let ctx = LoopContext::new().unwrap();
        assert!(ctx.enter_loop());
        assert!(ctx.is_running());
        let remote = Arc::clone(&ctx);
        let claimed = thread::spawn(move || remote.enter_loop()).join().unwrap();
        assert!(!claimed);
    }

    #[test]
    fn unregister_purges_pending() {
        let ctx = LoopContext::new().unwrap();
        let sink = Arc::new(Sink);
        let id = ctx.register(&sink);
        ctx.post(id, Message::Key(KeyEvent::new(1)));
        ctx.post(id, Message::Key(KeyEvent::new(2)));
        assert_eq!(ctx.pending(), 2);
        assert!(ctx.unregister(id));
        assert_eq!(ctx.pending(), 0);
    }

    #[test]
    fn stats_count_posts_and_coalescing() {
        let ctx = LoopContext::new().unwrap();
        let id = ReceiverId::from_raw(1);
        ctx.post(id, Message::Invalidate(Rect::whole_surface()));
        ctx.post(id, Message::Invalidate(Rect::new(0, 0, 2, 2)));
        ctx.post(id, Message::Key(KeyEvent::new(1)));
        let stats = ctx.stats();
        assert_eq!(stats.posted, 2);
        assert_eq!(stats.coalesced, 1);
        assert_eq!(stats.cycles, 0);
    }
}
