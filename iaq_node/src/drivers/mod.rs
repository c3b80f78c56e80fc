//! Device backends.
//!
//! - [`simulation`] - software sensors and a logging buzzer (default)
//! - [`sysfs`] - Linux IIO ADC and GPIO value files
//! - [`scripted`] - deterministic doubles for tests
//! - [`sink`] - reporting sinks
//!
//! [`open`] builds the sensor/actuator pair selected by the `[driver]`
//! config section.

pub mod scripted;
pub mod simulation;
pub mod sink;
pub mod sysfs;

use iaq_common::config::{Backend, DriverConfig};
use iaq_common::device::{Actuator, DeviceError, SensorSource};
use rand::Rng;
use std::sync::Arc;
use tracing::info;

/// Sensor source and actuator of one backend.
#[derive(Clone)]
pub struct DeviceSet {
    /// Shared by both sampling workers.
    pub sensor: Arc<dyn SensorSource>,
    /// Driven by the alert responder.
    pub actuator: Arc<dyn Actuator>,
}

/// Open the devices of the configured backend.
///
/// # Errors
/// Propagates the backend's `DeviceError` (missing sysfs files, etc.).
pub fn open(config: &DriverConfig) -> Result<DeviceSet, DeviceError> {
    let set = match config.backend {
        Backend::Simulation => DeviceSet {
            sensor: Arc::new(simulation::SimulatedSensor::new(&config.simulation)),
            actuator: Arc::new(simulation::LogActuator::new()),
        },
        Backend::Sysfs => DeviceSet {
            sensor: Arc::new(sysfs::SysfsSensor::open(&config.sysfs)?),
            actuator: Arc::new(sysfs::GpioActuator::open(&config.sysfs)?),
        },
    };
    info!("Devices opened: backend={}", set.sensor.name());
    Ok(set)
}

/// CO2 stand-in: alarm range while the button is held [ppm].
pub(crate) fn co2_stand_in<R: Rng>(rng: &mut R, pressed: bool) -> i32 {
    if pressed {
        rng.gen_range(1000..=4000)
    } else {
        rng.gen_range(400..=1000)
    }
}

/// Humidity stand-in: alarm range while the button is held [%].
pub(crate) fn humidity_stand_in<R: Rng>(rng: &mut R, pressed: bool) -> i32 {
    if pressed {
        rng.gen_range(70..=100)
    } else {
        rng.gen_range(30..=69)
    }
}
