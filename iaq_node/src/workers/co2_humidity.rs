//! CO2 and humidity sampling worker.
//!
//! Both metrics are read in the same cycle and written to the store under
//! one lock acquisition. The channel pushes do not wait on that lock: a
//! timed-out write still publishes the fresh values. A cycle where both are
//! abnormal raises both bits but pushes a single abnormal snapshot.

use iaq_common::config::TimingConfig;
use iaq_common::device::SensorSource;
use iaq_common::reading::MetricKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{CycleOutcome, Pipeline};
use crate::rate_limit::RateLimiter;
use crate::shutdown::ShutdownSignal;
use crate::store::SnapshotPair;

/// Samples CO2 and humidity every period and publishes them.
pub struct Co2HumidityWorker {
    sensor: Arc<dyn SensorSource>,
    pipeline: Pipeline,
    limiter: RateLimiter,
    last_seen: SnapshotPair,
    period: Duration,
}

impl Co2HumidityWorker {
    /// Worker name, also the thread name.
    pub const NAME: &'static str = "co2-humidity";

    /// Create the worker; one rate limiter covers both metrics.
    pub fn new(sensor: Arc<dyn SensorSource>, pipeline: Pipeline, timing: &TimingConfig) -> Self {
        Self {
            sensor,
            pipeline,
            limiter: RateLimiter::new(
                timing.report_interval(),
                &[MetricKind::Co2, MetricKind::Humidity],
            ),
            last_seen: SnapshotPair::initial(),
            period: timing.sample_period(),
        }
    }

    /// Run one sampling cycle.
    pub fn cycle(&mut self) -> CycleOutcome {
        let values = [
            (MetricKind::Co2, self.sensor.read_co2()),
            (MetricKind::Humidity, self.sensor.read_humidity()),
        ];

        let sink = self.pipeline.sink.as_ref();
        for &(kind, value) in &values {
            self.limiter.maybe_report(sink, kind, value);
        }

        let alert = self.pipeline.classify(&values);
        self.pipeline.publish_unguarded(&mut self.last_seen, &values, alert)
    }

    /// Sample until shutdown.
    pub fn run(mut self, shutdown: ShutdownSignal) {
        info!("CO2/humidity worker started ({}ms period)", self.period.as_millis());
        while !shutdown.is_triggered() {
            if self.cycle() == CycleOutcome::Closed || !shutdown.sleep(self.period) {
                break;
            }
        }
        info!("CO2/humidity worker stopped");
    }
}
