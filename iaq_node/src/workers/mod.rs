//! Worker threads of the monitoring node.
//!
//! ```text
//!  TemperatureWorker ─┐                 ┌─> RoutineQueue ──> DisplayWorker
//!                     ├─> ReadingStore ─┤
//!  Co2HumidityWorker ─┘                 ├─> AlertQueue ───┐
//!                                       └─> AlertFlags ───┴> AlertResponder ─> Actuator
//! ```
//!
//! Every worker owns a clone of the [`Pipeline`] and runs until its
//! [`ShutdownSignal`](crate::shutdown::ShutdownSignal) fires.

pub mod co2_humidity;
pub mod display;
pub mod responder;
pub mod temperature;

pub use co2_humidity::Co2HumidityWorker;
pub use display::DisplayWorker;
pub use responder::AlertResponder;
pub use temperature::TemperatureWorker;

use iaq_common::alert::AlertBits;
use iaq_common::config::NodeConfig;
use iaq_common::device::ReportingSink;
use iaq_common::reading::{MetricKind, Thresholds};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::QueueError;
use crate::flags::AlertFlags;
use crate::queue::{AlertQueue, PushOutcome, RoutineQueue};
use crate::store::{ReadingStore, SnapshotPair};

/// Outcome of one sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Sensor unavailable; nothing was written, pushed or reported.
    Skipped,
    /// Readings were published.
    Published {
        /// Abnormal metrics seen this cycle, empty when all are normal.
        alert: AlertBits,
        /// False if the store lock timed out and the write was skipped.
        /// A lock-gated publish then pushed nothing and raised no bit.
        store_updated: bool,
    },
    /// The alert channel was closed while pushing (shutdown).
    Closed,
}

/// Shared state every worker talks to.
#[derive(Clone)]
pub struct Pipeline {
    /// Last-known values, routine and abnormal snapshots.
    pub store: Arc<ReadingStore>,
    /// Every reading, best-effort.
    pub routine: RoutineQueue,
    /// Abnormal readings, lossless.
    pub alert: AlertQueue,
    /// Alert causes for the responder.
    pub flags: Arc<AlertFlags>,
    /// Telemetry endpoint.
    pub sink: Arc<dyn ReportingSink>,
    /// Classification limits.
    pub thresholds: Thresholds,
}

impl Pipeline {
    /// Build store, channels and flags from config.
    pub fn new(config: &NodeConfig, sink: Arc<dyn ReportingSink>) -> Self {
        Self {
            store: Arc::new(ReadingStore::new(config.timing.lock_timeout())),
            routine: RoutineQueue::new(config.channels.routine_capacity),
            alert: AlertQueue::new(config.channels.alert_capacity),
            flags: Arc::new(AlertFlags::new()),
            sink,
            thresholds: config.thresholds,
        }
    }

    /// Alert bits for the abnormal metrics among `values`.
    pub fn classify(&self, values: &[(MetricKind, i32)]) -> AlertBits {
        values
            .iter()
            .filter(|&&(kind, value)| self.thresholds.classify(kind, value).is_abnormal())
            .fold(AlertBits::empty(), |bits, &(kind, _)| bits | AlertBits::for_metric(kind))
    }

    /// Write `values` to the store and fan the written snapshots out.
    ///
    /// Everything after the write is gated on the store lock: on lock
    /// timeout nothing is pushed and no bit is set.
    pub fn publish(&self, values: &[(MetricKind, i32)], alert: AlertBits) -> CycleOutcome {
        match self.store.write_metrics(values) {
            Ok(pair) => self.fan_out(pair, alert, true),
            Err(e) => {
                warn!("{e}, cycle dropped");
                CycleOutcome::Published {
                    alert,
                    store_updated: false,
                }
            }
        }
    }

    /// Like [`publish`](Self::publish), but the pushes do not depend on
    /// the lock.
    ///
    /// `last_seen` is the calling worker's copy of the snapshots. It is
    /// refreshed from the store on success; on lock timeout the fresh
    /// values are overlaid on it and the pushes still go out.
    pub fn publish_unguarded(
        &self,
        last_seen: &mut SnapshotPair,
        values: &[(MetricKind, i32)],
        alert: AlertBits,
    ) -> CycleOutcome {
        let store_updated = match self.store.write_metrics(values) {
            Ok(pair) => {
                *last_seen = pair;
                true
            }
            Err(e) => {
                warn!("{e}, shared update skipped");
                for &(kind, value) in values {
                    last_seen.apply(kind, value);
                }
                false
            }
        };
        self.fan_out(*last_seen, alert, store_updated)
    }

    fn fan_out(&self, pair: SnapshotPair, alert: AlertBits, store_updated: bool) -> CycleOutcome {
        match self.routine.push(pair.normal) {
            Ok(PushOutcome::Queued) => {}
            Ok(PushOutcome::Dropped) => debug!("Routine channel full, reading dropped"),
            Err(e) => debug!("Routine push failed: {e}"),
        }

        let published = CycleOutcome::Published {
            alert,
            store_updated,
        };
        if alert.is_empty() {
            self.flags.set(AlertBits::NORMAL);
            return published;
        }

        // Bits go first: the responder must be able to wake and drain while
        // this producer is blocked on a full alert channel.
        self.flags.set(alert);
        match self.alert.push(pair.abnormal) {
            Ok(_) => published,
            Err(QueueError::Closed) => CycleOutcome::Closed,
            Err(e) => {
                warn!("Alert push failed: {e}");
                published
            }
        }
    }
}
