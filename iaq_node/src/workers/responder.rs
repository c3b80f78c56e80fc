//! Alert responder.
//!
//! # State machine
//!
//! ```text
//!            any alert bit (taken)
//!  Waiting ─────────────────────────> Draining
//!     ^                                  │ pop (bounded)
//!     │                                  ├─ reading: report flags, pulse buzzer
//!     │                                  └─ timeout: skip actuation
//!     └──────────── cool-down ───────────┘
//! ```
//!
//! The flag wait is unlimited in principle; it is sliced internally so the
//! thread can observe node shutdown.

use iaq_common::alert::AlertBits;
use iaq_common::config::{ResponderConfig, TimingConfig};
use iaq_common::device::Actuator;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::Pipeline;
use crate::error::QueueError;
use crate::shutdown::ShutdownSignal;

/// Granularity of the flag wait.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Result of handling one wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Alert reading popped, flags reported and actuator pulsed.
    Actuated,
    /// No reading within the bounded wait; actuation skipped.
    Skipped,
}

/// Responder counters.
#[derive(Debug, Default)]
pub struct ResponderStats {
    wakeups: AtomicU64,
    pulses: AtomicU64,
    skipped: AtomicU64,
}

impl ResponderStats {
    /// Flag wake-ups handled.
    pub fn wakeups(&self) -> u64 {
        self.wakeups.load(Ordering::Relaxed)
    }

    /// Actuator pulses.
    pub fn pulses(&self) -> u64 {
        self.pulses.load(Ordering::Relaxed)
    }

    /// Wake-ups without an alert reading.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Consumer of the alert flags and the alert channel.
pub struct AlertResponder {
    pipeline: Pipeline,
    actuator: Arc<dyn Actuator>,
    pop_timeout: Duration,
    pulse: Duration,
    cooldown: Duration,
    rearm_on_timeout: bool,
    stats: Arc<ResponderStats>,
}

impl AlertResponder {
    /// Worker name, also the thread name.
    pub const NAME: &'static str = "alert-responder";

    /// Create the responder.
    pub fn new(
        pipeline: Pipeline,
        actuator: Arc<dyn Actuator>,
        timing: &TimingConfig,
        config: &ResponderConfig,
    ) -> Self {
        Self {
            pipeline,
            actuator,
            pop_timeout: timing.alert_pop_timeout(),
            pulse: timing.buzzer_pulse(),
            cooldown: timing.alert_cooldown(),
            rearm_on_timeout: config.rearm_on_timeout,
            stats: Arc::new(ResponderStats::default()),
        }
    }

    /// Shared counters, readable while the responder runs.
    pub fn stats(&self) -> Arc<ResponderStats> {
        Arc::clone(&self.stats)
    }

    /// Block until any alert bit is set, then take the set bits.
    ///
    /// Returns `None` on shutdown.
    pub fn wait(&self, shutdown: &ShutdownSignal) -> Option<AlertBits> {
        loop {
            if shutdown.is_triggered() {
                return None;
            }
            let bits = self
                .pipeline
                .flags
                .wait_and_take(AlertBits::ALERT_MASK, Some(WAIT_SLICE));
            if bits.has_alert() {
                return Some(bits);
            }
        }
    }

    /// Drain one alert reading for the taken `bits`.
    pub fn handle(&self, bits: AlertBits) -> Response {
        self.stats.wakeups.fetch_add(1, Ordering::Relaxed);
        let reading = match self.pipeline.alert.pop_timeout(self.pop_timeout) {
            Ok(reading) => reading,
            Err(e) => {
                if matches!(e, QueueError::Timeout { .. }) && self.rearm_on_timeout {
                    debug!("Re-arming alert bits {bits:?}");
                    self.pipeline.flags.set(bits);
                }
                warn!("Alert {bits:?} without alert reading ({e}), actuation skipped");
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                return Response::Skipped;
            }
        };

        for metric in bits.metrics() {
            warn!(
                "{} ALERT: {} {}",
                metric.name(),
                reading.get(metric),
                metric.unit()
            );
            self.pipeline.sink.report_alert(metric, true);
        }

        warn!("Activating buzzer for {}ms", self.pulse.as_millis());
        self.pulse_actuator();
        self.stats.pulses.fetch_add(1, Ordering::Relaxed);
        Response::Actuated
    }

    fn pulse_actuator(&self) {
        if let Err(e) = self.actuator.set(true) {
            warn!("Buzzer on failed: {e}");
        }
        thread::sleep(self.pulse);
        if let Err(e) = self.actuator.set(false) {
            warn!("Buzzer off failed: {e}");
        }
    }

    /// Respond to alerts until shutdown.
    pub fn run(self, shutdown: ShutdownSignal) {
        info!(
            "Alert responder started (cool-down {}ms, rearm_on_timeout={})",
            self.cooldown.as_millis(),
            self.rearm_on_timeout
        );
        while let Some(bits) = self.wait(&shutdown) {
            self.handle(bits);
            if !shutdown.sleep(self.cooldown) {
                break;
            }
        }
        info!("Alert responder stopped");
    }
}
