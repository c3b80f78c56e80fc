//! Alert condition flags with wait-and-take.
//!
//! Producers OR bits in with [`AlertFlags::set`]. The single consumer blocks
//! in [`AlertFlags::wait_and_take`], which reads and clears the requested
//! bits under the same lock, so a bit set concurrently is either returned by
//! this wait or left for the next one. It is never lost and never handled
//! twice.

use iaq_common::alert::AlertBits;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Multi-bit condition signal shared by the sampling workers and the
/// alert responder.
#[derive(Debug, Default)]
pub struct AlertFlags {
    bits: Mutex<AlertBits>,
    cond: Condvar,
}

impl AlertFlags {
    /// Create with no bits set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `bits` and wake the waiter.
    pub fn set(&self, bits: AlertBits) {
        let mut current = self.bits.lock();
        *current |= bits;
        self.cond.notify_all();
    }

    /// Current bits, without clearing.
    pub fn peek(&self) -> AlertBits {
        *self.bits.lock()
    }

    /// Wait until any bit of `mask` is set, then clear and return the
    /// set bits of `mask`.
    ///
    /// `timeout = None` waits without limit. Returns an empty set if the
    /// timeout expired first. Bits outside `mask` are left untouched.
    pub fn wait_and_take(&self, mask: AlertBits, timeout: Option<Duration>) -> AlertBits {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut current = self.bits.lock();
        loop {
            let taken = *current & mask;
            if !taken.is_empty() {
                current.remove(taken);
                return taken;
            }
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut current, deadline).timed_out() {
                        let taken = *current & mask;
                        current.remove(taken);
                        return taken;
                    }
                }
                None => self.cond.wait(&mut current),
            }
        }
    }
}
