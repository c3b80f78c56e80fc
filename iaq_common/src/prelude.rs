//! Prelude module for common re-exports.
//!
//! ```rust
//! use iaq_common::prelude::*;
//! ```

// ─── Readings ───────────────────────────────────────────────────────
pub use crate::reading::{MetricKind, Reading, ReadingStatus, Thresholds};

// ─── Alerts ─────────────────────────────────────────────────────────
pub use crate::alert::AlertBits;

// ─── Devices ────────────────────────────────────────────────────────
pub use crate::device::{Actuator, DeviceError, ReportingSink, SensorSource};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, NodeConfig, SharedConfig};
