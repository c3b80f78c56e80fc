//! Temperature sampling worker.

use iaq_common::alert::AlertBits;
use iaq_common::config::TimingConfig;
use iaq_common::device::SensorSource;
use iaq_common::reading::MetricKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{CycleOutcome, Pipeline};
use crate::rate_limit::RateLimiter;
use crate::shutdown::ShutdownSignal;

/// Samples temperature every period and publishes it.
pub struct TemperatureWorker {
    sensor: Arc<dyn SensorSource>,
    pipeline: Pipeline,
    limiter: RateLimiter,
    period: Duration,
}

impl TemperatureWorker {
    /// Worker name, also the thread name.
    pub const NAME: &'static str = "temperature";

    /// Create the worker with its own rate limiter.
    pub fn new(sensor: Arc<dyn SensorSource>, pipeline: Pipeline, timing: &TimingConfig) -> Self {
        Self {
            sensor,
            pipeline,
            limiter: RateLimiter::new(timing.report_interval(), &[MetricKind::Temperature]),
            period: timing.sample_period(),
        }
    }

    /// Run one sampling cycle.
    pub fn cycle(&mut self) -> CycleOutcome {
        let value = match self.sensor.read_temperature() {
            Ok(value) => value,
            Err(e) => {
                debug!("Temperature cycle skipped: {e}");
                return CycleOutcome::Skipped;
            }
        };

        self.limiter
            .maybe_report(self.pipeline.sink.as_ref(), MetricKind::Temperature, value);

        let values = [(MetricKind::Temperature, value)];
        let alert: AlertBits = self.pipeline.classify(&values);
        self.pipeline.publish(&values, alert)
    }

    /// Sample until shutdown.
    pub fn run(mut self, shutdown: ShutdownSignal) {
        info!("Temperature worker started ({}ms period)", self.period.as_millis());
        while !shutdown.is_triggered() {
            if self.cycle() == CycleOutcome::Closed || !shutdown.sleep(self.period) {
                break;
            }
        }
        info!("Temperature worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::scripted::ScriptedSensor;
    use crate::drivers::sink::RecordingSink;
    use iaq_common::config::NodeConfig;
    use iaq_common::device::DeviceError;
    use iaq_common::reading::ReadingStatus;

    fn worker(sensor: ScriptedSensor) -> (TemperatureWorker, Pipeline, Arc<RecordingSink>) {
        let config = NodeConfig::default();
        let sink = Arc::new(RecordingSink::new());
        let pipeline = Pipeline::new(&config, sink.clone());
        let worker = TemperatureWorker::new(Arc::new(sensor), pipeline.clone(), &config.timing);
        (worker, pipeline, sink)
    }

    #[test]
    fn boundary_values_classify_as_documented() {
        let (mut w, p, _) = worker(ScriptedSensor::default().with_temperatures([18, 40, 17, 41]));
        let alerts: Vec<AlertBits> = (0..4)
            .map(|_| match w.cycle() {
                CycleOutcome::Published { alert, .. } => alert,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            alerts,
            vec![
                AlertBits::empty(),
                AlertBits::empty(),
                AlertBits::TEMPERATURE,
                AlertBits::TEMPERATURE
            ]
        );
        assert_eq!(p.alert.len(), 2);
        assert_eq!(p.routine.len(), 4);
    }

    #[test]
    fn unavailable_sensor_skips_everything() {
        let sensor = ScriptedSensor::default()
            .with_temperature_results([Err(DeviceError::Unavailable("raw=0".into()))]);
        let (mut w, p, sink) = worker(sensor);

        assert_eq!(w.cycle(), CycleOutcome::Skipped);
        assert!(p.routine.is_empty());
        assert!(p.flags.peek().is_empty());
        assert!(sink.reports().is_empty());
        assert_eq!(
            p.store.read_snapshot(ReadingStatus::Normal).unwrap().temperature,
            0
        );
    }

    #[test]
    fn sampling_resumes_after_unavailable_read() {
        let sensor = ScriptedSensor::default().with_temperature_results([
            Err(DeviceError::Unavailable("raw=0".into())),
            Ok(45),
        ]);
        let (mut w, p, sink) = worker(sensor);

        assert_eq!(w.cycle(), CycleOutcome::Skipped);
        assert_eq!(
            w.cycle(),
            CycleOutcome::Published {
                alert: AlertBits::TEMPERATURE,
                store_updated: true
            }
        );
        assert_eq!(sink.reports_for(MetricKind::Temperature), vec![45]);
        assert_eq!(p.flags.peek(), AlertBits::TEMPERATURE);
        assert_eq!(p.alert.len(), 1);
    }

    #[test]
    fn run_keeps_sampling_after_unavailable_read() {
        let sensor = Arc::new(ScriptedSensor::default().with_temperature_results([
            Err(DeviceError::Unavailable("raw=0".into())),
            Ok(21),
        ]));
        let config = NodeConfig::default();
        let mut timing = config.timing;
        timing.sample_period_ms = 5;
        let sink = Arc::new(RecordingSink::new());
        let p = Pipeline::new(&config, sink.clone());
        let w = TemperatureWorker::new(sensor.clone(), p.clone(), &timing);

        let shutdown = ShutdownSignal::new();
        let stopper = shutdown.clone();
        let handle = std::thread::spawn(move || w.run(stopper));
        std::thread::sleep(Duration::from_millis(100));
        shutdown.trigger();
        handle.join().unwrap();

        assert!(sensor.temperature_reads() >= 2);
        assert_eq!(sink.reports_for(MetricKind::Temperature), vec![21]);
        assert!(!p.routine.is_empty());
    }

    #[test]
    fn lock_timeout_pushes_nothing() {
        let mut config = NodeConfig::default();
        config.timing.lock_timeout_ms = 20;
        let sink = Arc::new(RecordingSink::new());
        let p = Pipeline::new(&config, sink.clone());
        let sensor = ScriptedSensor::default().with_temperatures([45]);
        let mut w = TemperatureWorker::new(Arc::new(sensor), p.clone(), &config.timing);

        let guard = p.store.hold_lock();
        let outcome = w.cycle();
        drop(guard);

        assert_eq!(
            outcome,
            CycleOutcome::Published {
                alert: AlertBits::TEMPERATURE,
                store_updated: false
            }
        );
        assert!(p.routine.is_empty());
        assert!(p.alert.is_empty());
        assert!(p.flags.peek().is_empty());
        // The rate-limited report does not depend on the lock.
        assert_eq!(sink.reports_for(MetricKind::Temperature), vec![45]);
    }

    #[test]
    fn repeated_value_is_reported_once() {
        let (mut w, _, sink) = worker(ScriptedSensor::default().with_temperatures([20, 20, 21]));
        for _ in 0..3 {
            w.cycle();
        }
        assert_eq!(sink.reports_for(MetricKind::Temperature), vec![20, 21]);
    }

    #[test]
    fn run_stops_on_shutdown() {
        let (w, _, _) = worker(ScriptedSensor::default());
        let shutdown = ShutdownSignal::new();
        let stopper = shutdown.clone();
        let handle = std::thread::spawn(move || w.run(stopper));
        std::thread::sleep(Duration::from_millis(50));
        shutdown.trigger();
        handle.join().unwrap();
    }
}
