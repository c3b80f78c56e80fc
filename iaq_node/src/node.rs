//! Monitoring node lifecycle.
//!
//! [`MonitorNode`] wires the devices, the reading store, both channels and
//! the alert flags together and runs one OS thread per worker:
//!
//! | Thread | Priority (`rt`) | Period |
//! |--------|-----------------|--------|
//! | `temperature` | 5 | 200 ms |
//! | `co2-humidity` | 5 | 200 ms |
//! | `alert-responder` | 4 | event driven, 10 s cool-down |
//! | `display` | 1 | 5 s |
//!
//! A node is started once. `shutdown()` stops every worker, turns the
//! actuator off and logs the final counters.

use iaq_common::config::NodeConfig;
use iaq_common::device::{Actuator, ReportingSink, SensorSource};
use iaq_common::reading::MetricKind;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::drivers::DeviceSet;
use crate::error::NodeError;
use crate::queue::QueueStats;
use crate::rt;
use crate::shutdown::ShutdownSignal;
use crate::workers::responder::ResponderStats;
use crate::workers::{AlertResponder, Co2HumidityWorker, DisplayWorker, Pipeline, TemperatureWorker};

/// Counter snapshot of a running node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Routine channel counters.
    pub routine: QueueStats,
    /// Alert channel counters.
    pub alert: QueueStats,
    /// Responder wake-ups.
    pub alert_wakeups: u64,
    /// Actuator pulses.
    pub pulses: u64,
    /// Wake-ups without an alert reading.
    pub skipped_actuations: u64,
}

impl fmt::Display for NodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "routine pushed={} dropped={} popped={}, alert pushed={} popped={}, \
             wakeups={} pulses={} skipped={}",
            self.routine.pushed,
            self.routine.dropped,
            self.routine.popped,
            self.alert.pushed,
            self.alert.popped,
            self.alert_wakeups,
            self.pulses,
            self.skipped_actuations
        )
    }
}

/// The monitoring node.
pub struct MonitorNode {
    config: NodeConfig,
    sensor: Arc<dyn SensorSource>,
    actuator: Arc<dyn Actuator>,
    pipeline: Pipeline,
    shutdown: ShutdownSignal,
    workers: Vec<(&'static str, JoinHandle<()>)>,
    responder_stats: Arc<ResponderStats>,
    started: bool,
}

impl MonitorNode {
    /// Create a node from a validated config and opened devices.
    ///
    /// # Errors
    /// `NodeError::Config` if the configuration is invalid.
    pub fn new(
        config: NodeConfig,
        devices: DeviceSet,
        sink: Arc<dyn ReportingSink>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let pipeline = Pipeline::new(&config, sink);
        info!(
            "Node '{}' created: sensor={}, routine={}/{}, alert={}/{}",
            config.shared.service_name,
            devices.sensor.name(),
            pipeline.routine.capacity(),
            pipeline.routine.policy(),
            pipeline.alert.capacity(),
            pipeline.alert.policy()
        );
        Ok(Self {
            config,
            sensor: devices.sensor,
            actuator: devices.actuator,
            pipeline,
            shutdown: ShutdownSignal::new(),
            workers: Vec::new(),
            responder_stats: Arc::new(ResponderStats::default()),
            started: false,
        })
    }

    /// Spawn all worker threads.
    ///
    /// Alert flags are published as cleared before any worker runs.
    ///
    /// # Errors
    /// - `NodeError::AlreadyRunning` if the workers are running
    /// - `NodeError::Stopped` after `shutdown()`
    /// - `NodeError::RtSetup` if memory locking fails (`rt` feature)
    /// - `NodeError::Spawn` if a thread cannot be created; workers started
    ///   so far are stopped again
    pub fn start(&mut self) -> Result<(), NodeError> {
        if self.shutdown.is_triggered() {
            return Err(NodeError::Stopped);
        }
        if self.started {
            return Err(NodeError::AlreadyRunning);
        }
        rt::lock_memory()?;
        if rt::detect_rt_mode() {
            info!("Process already runs under a real-time policy");
        }

        for metric in MetricKind::ALL {
            self.pipeline.sink.report_alert(metric, false);
        }

        self.started = true;
        if let Err(e) = self.spawn_all() {
            error!("Startup failed: {e}");
            self.stop_workers();
            return Err(e);
        }
        info!("Node started with {} workers", self.workers.len());
        Ok(())
    }

    fn spawn_all(&mut self) -> Result<(), NodeError> {
        let timing = self.config.timing;
        let prio = self.config.scheduling;

        let temperature =
            TemperatureWorker::new(Arc::clone(&self.sensor), self.pipeline.clone(), &timing);
        self.spawn(TemperatureWorker::NAME, prio.temperature_priority, move |s| {
            temperature.run(s)
        })?;

        let co2_humidity =
            Co2HumidityWorker::new(Arc::clone(&self.sensor), self.pipeline.clone(), &timing);
        self.spawn(Co2HumidityWorker::NAME, prio.co2_humidity_priority, move |s| {
            co2_humidity.run(s)
        })?;

        let responder = AlertResponder::new(
            self.pipeline.clone(),
            Arc::clone(&self.actuator),
            &timing,
            &self.config.responder,
        );
        self.responder_stats = responder.stats();
        self.spawn(AlertResponder::NAME, prio.responder_priority, move |s| {
            responder.run(s)
        })?;

        let display = DisplayWorker::new(self.pipeline.routine.clone(), &timing);
        self.spawn(DisplayWorker::NAME, prio.display_priority, move |s| display.run(s))?;
        Ok(())
    }

    fn spawn<F>(&mut self, name: &'static str, priority: i32, body: F) -> Result<(), NodeError>
    where
        F: FnOnce(ShutdownSignal) + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                if let Err(e) = rt::set_thread_priority(priority) {
                    warn!("{name}: {e}, running with default priority");
                }
                body(shutdown);
            })
            .map_err(|source| NodeError::Spawn {
                worker: name,
                source,
            })?;
        debug!("Spawned worker '{name}' (priority {priority})");
        self.workers.push((name, handle));
        Ok(())
    }

    /// Drive the actuator directly (remote buzzer switch).
    ///
    /// # Errors
    /// `NodeError::Device` if the actuator cannot be driven.
    pub fn set_buzzer(&self, on: bool) -> Result<(), NodeError> {
        info!("Manual buzzer {}", if on { "ON" } else { "OFF" });
        self.actuator.set(on)?;
        Ok(())
    }

    /// Current counters.
    pub fn stats(&self) -> NodeStats {
        NodeStats {
            routine: self.pipeline.routine.stats(),
            alert: self.pipeline.alert.stats(),
            alert_wakeups: self.responder_stats.wakeups(),
            pulses: self.responder_stats.pulses(),
            skipped_actuations: self.responder_stats.skipped(),
        }
    }

    /// Shared state, for inspection.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Signal that stops the node's workers; clone it for signal handlers.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// True while worker threads are running.
    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Loaded configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Stop all workers, switch the actuator off and log the counters.
    ///
    /// # Errors
    /// `NodeError::WorkerPanicked` naming the first worker that panicked.
    pub fn shutdown(&mut self) -> Result<(), NodeError> {
        info!("Shutdown requested");
        let panicked = self.stop_workers();

        if let Err(e) = self.actuator.set(false) {
            warn!("Failed to switch actuator off: {e}");
        }
        info!("Node stopped: {}", self.stats());

        match panicked {
            Some(worker) => Err(NodeError::WorkerPanicked(worker)),
            None => Ok(()),
        }
    }

    /// Trigger the signal, release blocked producers and join every thread.
    fn stop_workers(&mut self) -> Option<&'static str> {
        self.shutdown.trigger();
        self.pipeline.routine.close();
        self.pipeline.alert.close();

        let mut panicked = None;
        for (name, handle) in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("Worker '{name}' panicked");
                panicked.get_or_insert(name);
            } else {
                debug!("Worker '{name}' joined");
            }
        }
        panicked
    }
}

impl Drop for MonitorNode {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.shutdown();
        }
    }
}
