//! Per-metric report rate limiter.
//!
//! A value is forwarded to the [`ReportingSink`] when it differs from the
//! last reported value, or when the last report is at least one interval
//! old. Entries start from a sentinel value, so the first sample after
//! startup is always reported.
//!
//! Each sampling worker owns the limiter for its own metrics; the limiter
//! carries no lock and must not be shared between workers.

use heapless::LinearMap;
use iaq_common::device::ReportingSink;
use iaq_common::reading::MetricKind;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Initial `last_value`; no sensor produces it.
const SENTINEL: i32 = i32::MIN;

/// Rate-limit state of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateEntry {
    /// Last value passed to the sink.
    pub last_value: i32,
    /// Time of the last report, `None` before the first one.
    pub last_report: Option<Instant>,
}

impl RateEntry {
    const fn new() -> Self {
        Self {
            last_value: SENTINEL,
            last_report: None,
        }
    }

    fn is_due(&self, value: i32, now: Instant, interval: Duration) -> bool {
        if value != self.last_value {
            return true;
        }
        match self.last_report {
            Some(at) => now.saturating_duration_since(at) >= interval,
            None => true,
        }
    }
}

/// Rate limiter for the metrics of one sampling worker.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    entries: LinearMap<MetricKind, RateEntry, { MetricKind::COUNT }>,
}

impl RateLimiter {
    /// Create entries for `metrics`, all at the sentinel value.
    pub fn new(interval: Duration, metrics: &[MetricKind]) -> Self {
        let mut entries = LinearMap::new();
        for &kind in metrics {
            // At most one entry per metric kind, so capacity cannot run out.
            let _ = entries.insert(kind, RateEntry::new());
        }
        Self { interval, entries }
    }

    /// Report `value` if it changed or the interval elapsed.
    ///
    /// Returns `true` if the sink was called.
    pub fn maybe_report(&mut self, sink: &dyn ReportingSink, metric: MetricKind, value: i32) -> bool {
        self.maybe_report_at(sink, metric, value, Instant::now())
    }

    /// [`maybe_report`](Self::maybe_report) with an explicit clock reading.
    pub fn maybe_report_at(
        &mut self,
        sink: &dyn ReportingSink,
        metric: MetricKind,
        value: i32,
        now: Instant,
    ) -> bool {
        let interval = self.interval;
        let Some(entry) = self.entries.get_mut(&metric) else {
            warn!("{metric} is not owned by this rate limiter, report skipped");
            return false;
        };

        if !entry.is_due(value, now, interval) {
            return false;
        }

        sink.report(metric, value);
        entry.last_value = value;
        entry.last_report = Some(now);
        debug!("Reported {metric}: {value}");
        true
    }

    /// State of one metric, if owned.
    pub fn entry(&self, metric: MetricKind) -> Option<&RateEntry> {
        self.entries.get(&metric)
    }
}
