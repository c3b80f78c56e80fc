//! Device contracts and error types.
//!
//! This module defines the three collaborators the sampling/alerting engine
//! talks to:
//! - `SensorSource` - pull interface for temperature, CO2 and humidity
//! - `ReportingSink` - fire-and-forget telemetry endpoint
//! - `Actuator` - local audible output
//!
//! Implementations live in `iaq_node::drivers` (hardware, simulation and
//! deterministic test doubles).

use thiserror::Error;

use crate::reading::MetricKind;

/// Error types for device operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Sensor did not deliver a usable value this cycle.
    #[error("Sensor unavailable: {0}")]
    Unavailable(String),

    /// Device file or bus access failed.
    #[error("Device I/O error: {0}")]
    Io(String),

    /// Device returned data that could not be interpreted.
    #[error("Invalid device data: {0}")]
    InvalidData(String),

    /// Device initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),
}

/// Pull interface to the environmental sensors.
///
/// Both sampling workers share one source, so implementations must be
/// `Send + Sync` and use interior mutability where they keep state.
///
/// # Timing Contracts
///
/// | Operation | Max Duration |
/// |-----------|--------------|
/// | `read_temperature()` | well below the sampling period |
/// | `read_co2()` | well below the sampling period |
/// | `read_humidity()` | well below the sampling period |
pub trait SensorSource: Send + Sync {
    /// Backend identifier (e.g., "simulation", "sysfs").
    fn name(&self) -> &'static str;

    /// Read temperature [°C].
    ///
    /// # Errors
    /// `DeviceError::Unavailable` when the sensor is disconnected or the
    /// conversion failed. The caller skips the cycle and keeps sampling.
    fn read_temperature(&self) -> Result<i32, DeviceError>;

    /// Read CO2 concentration [ppm].
    fn read_co2(&self) -> i32;

    /// Read relative humidity [%].
    fn read_humidity(&self) -> i32;
}

/// Telemetry endpoint receiving metric values and alert flags.
///
/// Calls are fire-and-forget: the engine never waits on or retries a
/// report, so implementations must return quickly and swallow their own
/// transport errors.
pub trait ReportingSink: Send + Sync {
    /// Publish the current value of a metric.
    fn report(&self, metric: MetricKind, value: i32);

    /// Publish the alert flag of a metric.
    fn report_alert(&self, metric: MetricKind, active: bool);
}

/// Local audible/visual output.
pub trait Actuator: Send + Sync {
    /// Switch the output on or off.
    ///
    /// # Errors
    /// `DeviceError::Io` if the output could not be driven.
    fn set(&self, on: bool) -> Result<(), DeviceError>;
}
