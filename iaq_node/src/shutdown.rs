//! Interruptible sleeping for worker loops.
//!
//! Workers pace themselves with [`ShutdownSignal::sleep`] instead of
//! `std::thread::sleep`, so a shutdown request wakes every sleeping worker
//! immediately instead of waiting out a 10 s cool-down.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    stopped: Mutex<bool>,
    cond: Condvar,
}

/// Cloneable shutdown flag with wake-up.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    /// New signal in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake all sleepers.
    pub fn trigger(&self) {
        let mut stopped = self.inner.stopped.lock();
        *stopped = true;
        self.inner.cond.notify_all();
    }

    /// True once shutdown was requested.
    pub fn is_triggered(&self) -> bool {
        *self.inner.stopped.lock()
    }

    /// Block until shutdown is requested.
    pub fn wait(&self) {
        let mut stopped = self.inner.stopped.lock();
        while !*stopped {
            self.inner.cond.wait(&mut stopped);
        }
    }

    /// Sleep for `duration` unless shutdown is requested first.
    ///
    /// Returns `true` if the full duration elapsed, `false` on shutdown.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut stopped = self.inner.stopped.lock();
        while !*stopped {
            if self.inner.cond.wait_until(&mut stopped, deadline).timed_out() {
                return !*stopped;
            }
        }
        false
    }
}
