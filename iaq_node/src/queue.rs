//! Bounded FIFO queue with a compile-time full-queue policy.
//!
//! One queue type serves both channels:
//! - [`RoutineQueue`] (`DropOnFull`): push never blocks; a full queue drops
//!   the new message silently.
//! - [`AlertQueue`] (`BlockOnFull`): push blocks the producer until the
//!   consumer frees a slot, so alert data is never silently lost.
//!
//! Blocking pushes wake up periodically to observe [`BoundedQueue::close`],
//! which is how node shutdown releases a producer stuck on a full queue.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use iaq_common::reading::Reading;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::error::QueueError;

/// Interval at which a blocked producer re-checks the closed flag.
const CLOSE_POLL: Duration = Duration::from_millis(50);

/// Result of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Message is in the queue.
    Queued,
    /// Queue was full and the message was discarded.
    Dropped,
}

/// Behaviour of `push` on a full queue.
pub trait FullPolicy: Send + Sync + 'static {
    /// Policy name for logs.
    const NAME: &'static str;

    /// Push `msg` according to the policy.
    fn push<T>(queue: &Shared<T>, msg: T) -> Result<PushOutcome, QueueError>;
}

/// Drop the new message when the queue is full.
#[derive(Debug, Clone, Copy)]
pub struct DropOnFull;

/// Block the producer until a slot is free.
#[derive(Debug, Clone, Copy)]
pub struct BlockOnFull;

impl FullPolicy for DropOnFull {
    const NAME: &'static str = "drop-on-full";

    fn push<T>(queue: &Shared<T>, msg: T) -> Result<PushOutcome, QueueError> {
        match queue.tx.try_send(msg) {
            Ok(()) => Ok(PushOutcome::Queued),
            Err(TrySendError::Full(_)) => Ok(PushOutcome::Dropped),
            Err(TrySendError::Disconnected(_)) => Err(QueueError::Closed),
        }
    }
}

impl FullPolicy for BlockOnFull {
    const NAME: &'static str = "block-on-full";

    fn push<T>(queue: &Shared<T>, mut msg: T) -> Result<PushOutcome, QueueError> {
        loop {
            if queue.closed.load(Ordering::Acquire) {
                return Err(QueueError::Closed);
            }
            match queue.tx.send_timeout(msg, CLOSE_POLL) {
                Ok(()) => return Ok(PushOutcome::Queued),
                Err(SendTimeoutError::Timeout(back)) => msg = back,
                Err(SendTimeoutError::Disconnected(_)) => return Err(QueueError::Closed),
            }
        }
    }
}

/// Point-in-time queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Messages accepted.
    pub pushed: u64,
    /// Messages discarded on a full queue.
    pub dropped: u64,
    /// Messages taken by the consumer.
    pub popped: u64,
    /// Messages currently queued.
    pub len: usize,
    /// Fixed capacity.
    pub capacity: usize,
}

/// Channel endpoints and counters shared by all clones of a queue.
#[derive(Debug)]
pub struct Shared<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
    closed: AtomicBool,
    pushed: AtomicU64,
    dropped: AtomicU64,
    popped: AtomicU64,
}

/// Fixed-capacity FIFO between worker threads.
#[derive(Debug)]
pub struct BoundedQueue<T, P: FullPolicy> {
    shared: Arc<Shared<T>>,
    _policy: PhantomData<P>,
}

/// Routine channel: every reading, best-effort.
pub type RoutineQueue = BoundedQueue<Reading, DropOnFull>;

/// Alert channel: abnormal readings, lossless.
pub type AlertQueue = BoundedQueue<Reading, BlockOnFull>;

impl<T, P: FullPolicy> Clone for BoundedQueue<T, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            _policy: PhantomData,
        }
    }
}

impl<T, P: FullPolicy> BoundedQueue<T, P> {
    /// Create a queue holding at most `capacity` messages.
    ///
    /// # Panics
    /// Panics if `capacity` is zero (configuration validation rejects it).
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        let (tx, rx) = channel::bounded(capacity);
        Self {
            shared: Arc::new(Shared {
                tx,
                rx,
                capacity,
                closed: AtomicBool::new(false),
                pushed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                popped: AtomicU64::new(0),
            }),
            _policy: PhantomData,
        }
    }

    /// Push a message according to the queue's policy.
    ///
    /// # Errors
    /// `QueueError::Closed` once the queue has been closed.
    pub fn push(&self, msg: T) -> Result<PushOutcome, QueueError> {
        let outcome = P::push(&self.shared, msg)?;
        let counter = match outcome {
            PushOutcome::Queued => &self.shared.pushed,
            PushOutcome::Dropped => &self.shared.dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(outcome)
    }

    /// Pop the oldest message, waiting at most `timeout`.
    ///
    /// # Errors
    /// `QueueError::Timeout` if nothing arrived in time.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
        match self.shared.rx.recv_timeout(timeout) {
            Ok(msg) => {
                self.shared.popped.fetch_add(1, Ordering::Relaxed);
                Ok(msg)
            }
            Err(RecvTimeoutError::Timeout) => Err(QueueError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(QueueError::Closed),
        }
    }

    /// Pop the oldest message without waiting.
    pub fn try_pop(&self) -> Option<T> {
        let msg = self.shared.rx.try_recv().ok()?;
        self.shared.popped.fetch_add(1, Ordering::Relaxed);
        Some(msg)
    }

    /// Release producers blocked on a full queue and refuse further
    /// blocking pushes.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
    }

    /// Messages currently queued.
    pub fn len(&self) -> usize {
        self.shared.rx.len()
    }

    /// True if no message is queued.
    pub fn is_empty(&self) -> bool {
        self.shared.rx.is_empty()
    }

    /// True if the queue holds `capacity` messages.
    pub fn is_full(&self) -> bool {
        self.shared.tx.is_full()
    }

    /// Fixed capacity.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Policy name for logs.
    pub fn policy(&self) -> &'static str {
        P::NAME
    }

    /// Counter snapshot.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.shared.pushed.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
            popped: self.shared.popped.load(Ordering::Relaxed),
            len: self.len(),
            capacity: self.shared.capacity,
        }
    }
}
