//! Reporting sink implementations.
//!
//! - [`TracingSink`] - logs every report (default for the binary)
//! - [`JsonLinesSink`] - one JSON object per report on any writer
//! - [`RecordingSink`] - keeps every call in memory for tests

use iaq_common::device::ReportingSink;
use iaq_common::reading::MetricKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportingSink for TracingSink {
    fn report(&self, metric: MetricKind, value: i32) {
        debug!(metric = metric.name(), value, "report {} {}", value, metric.unit());
    }

    fn report_alert(&self, metric: MetricKind, active: bool) {
        info!(metric = metric.name(), active, "alert flag {metric} = {}", u8::from(active));
    }
}

/// One line of [`JsonLinesSink`] output.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record {
    Value {
        metric: MetricKind,
        value: i32,
        timestamp_ms: u64,
    },
    Alert {
        metric: MetricKind,
        active: bool,
        timestamp_ms: u64,
    },
}

/// Sink writing newline-delimited JSON records.
///
/// Write failures are logged and otherwise ignored: reporting is
/// fire-and-forget.
pub struct JsonLinesSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesSink {
    /// Wrap a writer (stdout, a file, a socket).
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn emit(&self, record: &Record) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to encode report: {e}");
                return;
            }
        };
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!("Failed to write report: {e}");
        }
    }
}

impl ReportingSink for JsonLinesSink {
    fn report(&self, metric: MetricKind, value: i32) {
        self.emit(&Record::Value {
            metric,
            value,
            timestamp_ms: now_ms(),
        });
    }

    fn report_alert(&self, metric: MetricKind, active: bool) {
        self.emit(&Record::Alert {
            metric,
            active,
            timestamp_ms: now_ms(),
        });
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Sink that records every call.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<(MetricKind, i32)>>,
    alerts: Mutex<Vec<(MetricKind, bool)>>,
}

impl RecordingSink {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All value reports, in call order.
    pub fn reports(&self) -> Vec<(MetricKind, i32)> {
        self.reports.lock().clone()
    }

    /// Value reports of one metric.
    pub fn reports_for(&self, metric: MetricKind) -> Vec<i32> {
        self.reports
            .lock()
            .iter()
            .filter(|(m, _)| *m == metric)
            .map(|&(_, v)| v)
            .collect()
    }

    /// All alert flag reports, in call order.
    pub fn alerts(&self) -> Vec<(MetricKind, bool)> {
        self.alerts.lock().clone()
    }

    /// Alert flag reports with `active == true`.
    pub fn raised_alerts(&self) -> Vec<MetricKind> {
        self.alerts
            .lock()
            .iter()
            .filter(|(_, active)| *active)
            .map(|&(m, _)| m)
            .collect()
    }
}

impl ReportingSink for RecordingSink {
    fn report(&self, metric: MetricKind, value: i32) {
        self.reports.lock().push((metric, value));
    }

    fn report_alert(&self, metric: MetricKind, active: bool) {
        self.alerts.lock().push((metric, active));
    }
}
