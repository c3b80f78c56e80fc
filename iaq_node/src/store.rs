//! Shared reading store.
//!
//! Owns the two long-lived snapshots (routine and abnormal). Every access
//! goes through a single mutex with a bounded wait; an expired wait is
//! reported as [`StoreError::LockTimeout`] and the caller skips its shared
//! update for that cycle.

use iaq_common::reading::{MetricKind, Reading, ReadingStatus};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::trace;

use crate::error::StoreError;

/// Copies of both snapshots taken under the store lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPair {
    /// Routine snapshot, always tagged [`ReadingStatus::Normal`].
    pub normal: Reading,
    /// Alert snapshot, always tagged [`ReadingStatus::Abnormal`].
    pub abnormal: Reading,
}

impl SnapshotPair {
    /// Zeroed pair as created at startup.
    pub const fn initial() -> Self {
        Self {
            normal: Reading::tagged(ReadingStatus::Normal),
            abnormal: Reading::tagged(ReadingStatus::Abnormal),
        }
    }

    /// Overwrite one metric in both snapshots.
    pub fn apply(&mut self, kind: MetricKind, value: i32) {
        self.normal.set(kind, value);
        self.abnormal.set(kind, value);
    }

    /// Snapshot carrying the given tag.
    pub const fn get(&self, status: ReadingStatus) -> Reading {
        match status {
            ReadingStatus::Normal => self.normal,
            ReadingStatus::Abnormal => self.abnormal,
        }
    }
}

impl Default for SnapshotPair {
    fn default() -> Self {
        Self::initial()
    }
}

/// Lock-guarded owner of the routine and abnormal snapshots.
#[derive(Debug)]
pub struct ReadingStore {
    snapshots: Mutex<SnapshotPair>,
    lock_timeout: Duration,
}

impl ReadingStore {
    /// Create a store with zeroed snapshots.
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            snapshots: Mutex::new(SnapshotPair::initial()),
            lock_timeout,
        }
    }

    /// Write one metric into both snapshots.
    ///
    /// Returns copies of both snapshots as they are after the write.
    ///
    /// # Errors
    /// `StoreError::LockTimeout` if the lock was not acquired in time.
    pub fn write_metric(&self, kind: MetricKind, value: i32) -> Result<SnapshotPair, StoreError> {
        self.write_metrics(&[(kind, value)])
    }

    /// Write several metrics into both snapshots under one lock acquisition.
    ///
    /// # Errors
    /// `StoreError::LockTimeout` if the lock was not acquired in time.
    pub fn write_metrics(&self, values: &[(MetricKind, i32)]) -> Result<SnapshotPair, StoreError> {
        let mut guard = self.lock()?;
        for &(kind, value) in values {
            guard.apply(kind, value);
        }
        trace!("store updated: {}", guard.normal);
        Ok(*guard)
    }

    /// Copy of the snapshot carrying `status`.
    ///
    /// # Errors
    /// `StoreError::LockTimeout` if the lock was not acquired in time.
    pub fn read_snapshot(&self, status: ReadingStatus) -> Result<Reading, StoreError> {
        Ok(self.lock()?.get(status))
    }

    fn lock(&self) -> Result<parking_lot::MutexGuard<'_, SnapshotPair>, StoreError> {
        self.snapshots
            .try_lock_for(self.lock_timeout)
            .ok_or(StoreError::LockTimeout {
                timeout_ms: self.lock_timeout.as_millis() as u64,
            })
    }

    #[cfg(test)]
    pub(crate) fn hold_lock(&self) -> parking_lot::MutexGuard<'_, SnapshotPair> {
        self.snapshots.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn store() -> ReadingStore {
        ReadingStore::new(Duration::from_millis(50))
    }

    #[test]
    fn starts_zeroed_and_tagged() {
        let store = store();
        let normal = store.read_snapshot(ReadingStatus::Normal).unwrap();
        let abnormal = store.read_snapshot(ReadingStatus::Abnormal).unwrap();
        assert_eq!(normal, Reading::tagged(ReadingStatus::Normal));
        assert_eq!(abnormal.status, ReadingStatus::Abnormal);
        assert_eq!(abnormal.temperature, 0);
    }

    #[test]
    fn write_updates_both_snapshots() {
        let store = store();
        let pair = store.write_metric(MetricKind::Temperature, 45).unwrap();
        assert_eq!(pair.normal.temperature, 45);
        assert_eq!(pair.abnormal.temperature, 45);
        assert_eq!(pair.normal.status, ReadingStatus::Normal);
        assert_eq!(pair.abnormal.status, ReadingStatus::Abnormal);
    }

    #[test]
    fn non_owned_fields_keep_last_value() {
        let store = store();
        store
            .write_metrics(&[(MetricKind::Co2, 1800), (MetricKind::Humidity, 60)])
            .unwrap();
        store.write_metric(MetricKind::Temperature, 21).unwrap();
        store.write_metric(MetricKind::Temperature, 22).unwrap();

        let normal = store.read_snapshot(ReadingStatus::Normal).unwrap();
        assert_eq!(normal.co2, 1800);
        assert_eq!(normal.humidity, 60);
        assert_eq!(normal.temperature, 22);
    }

    #[test]
    fn write_times_out_while_lock_is_held() {
        let store = Arc::new(store());
        let guard = store.hold_lock();

        let writer = Arc::clone(&store);
        let result = thread::spawn(move || writer.write_metric(MetricKind::Co2, 900))
            .join()
            .unwrap();
        drop(guard);

        assert_eq!(result, Err(StoreError::LockTimeout { timeout_ms: 50 }));
        // The skipped write left the snapshot untouched.
        let normal = store.read_snapshot(ReadingStatus::Normal).unwrap();
        assert_eq!(normal.co2, 0);
    }
}
