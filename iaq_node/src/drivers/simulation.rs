//! Simulation backend.
//!
//! Software stand-ins for the board: a seeded random temperature walk and
//! the two "stand-in" buttons that push CO2 and humidity into their alarm
//! ranges while pressed. The buzzer is a logging actuator.

use iaq_common::config::SimulationConfig;
use iaq_common::device::{Actuator, DeviceError, SensorSource};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use super::{co2_stand_in, humidity_stand_in};

/// Maximum distance of the temperature walk from its base [°C].
const WALK_SPAN_C: i32 = 2;

#[derive(Debug)]
struct SimState {
    rng: StdRng,
    temperature: i32,
    temperature_override: Option<i32>,
}

/// Software sensor source.
#[derive(Debug)]
pub struct SimulatedSensor {
    state: Mutex<SimState>,
    base_temp_c: i32,
    co2_button: AtomicBool,
    humidity_button: AtomicBool,
    disconnected: AtomicBool,
}

impl SimulatedSensor {
    /// Create from config. A missing seed draws one from entropy.
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: Mutex::new(SimState {
                rng,
                temperature: config.base_temp_c,
                temperature_override: None,
            }),
            base_temp_c: config.base_temp_c,
            co2_button: AtomicBool::new(false),
            humidity_button: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
        }
    }

    /// Press or release the CO2 stand-in button.
    pub fn set_co2_button(&self, pressed: bool) {
        debug!("Simulated CO2 button {}", if pressed { "pressed" } else { "released" });
        self.co2_button.store(pressed, Ordering::Relaxed);
    }

    /// Press or release the humidity stand-in button.
    pub fn set_humidity_button(&self, pressed: bool) {
        debug!("Simulated humidity button {}", if pressed { "pressed" } else { "released" });
        self.humidity_button.store(pressed, Ordering::Relaxed);
    }

    /// Pin the temperature to a fixed value, or return to the walk.
    pub fn set_temperature_override(&self, value: Option<i32>) {
        self.state.lock().temperature_override = value;
    }

    /// Simulate an unplugged temperature sensor.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.disconnected.store(disconnected, Ordering::Relaxed);
    }
}

impl SensorSource for SimulatedSensor {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn read_temperature(&self) -> Result<i32, DeviceError> {
        if self.disconnected.load(Ordering::Relaxed) {
            return Err(DeviceError::Unavailable("simulated sensor disconnected".into()));
        }
        let mut state = self.state.lock();
        if let Some(value) = state.temperature_override {
            return Ok(value);
        }
        let step = state.rng.gen_range(-1..=1);
        let low = self.base_temp_c - WALK_SPAN_C;
        let high = self.base_temp_c + WALK_SPAN_C;
        state.temperature = (state.temperature + step).clamp(low, high);
        Ok(state.temperature)
    }

    fn read_co2(&self) -> i32 {
        let pressed = self.co2_button.load(Ordering::Relaxed);
        co2_stand_in(&mut self.state.lock().rng, pressed)
    }

    fn read_humidity(&self) -> i32 {
        let pressed = self.humidity_button.load(Ordering::Relaxed);
        humidity_stand_in(&mut self.state.lock().rng, pressed)
    }
}

/// Actuator that only logs state changes.
#[derive(Debug, Default)]
pub struct LogActuator {
    on: AtomicBool,
}

impl LogActuator {
    /// Actuator in the off state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current output state.
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }
}

impl Actuator for LogActuator {
    fn set(&self, on: bool) -> Result<(), DeviceError> {
        if self.on.swap(on, Ordering::AcqRel) != on {
            info!("Buzzer {}", if on { "ON" } else { "OFF" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SimulatedSensor {
        SimulatedSensor::new(&SimulationConfig {
            seed: Some(7),
            base_temp_c: 22,
        })
    }

    #[test]
    fn temperature_walk_stays_near_base() {
        let sensor = seeded();
        for _ in 0..500 {
            let t = sensor.read_temperature().unwrap();
            assert!((20..=24).contains(&t), "temperature {t} left the walk span");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = seeded();
        let b = seeded();
        for _ in 0..50 {
            assert_eq!(a.read_temperature(), b.read_temperature());
            assert_eq!(a.read_co2(), b.read_co2());
        }
    }

    #[test]
    fn buttons_select_alarm_ranges() {
        let sensor = seeded();
        for _ in 0..200 {
            assert!((400..=1000).contains(&sensor.read_co2()));
            assert!((30..=69).contains(&sensor.read_humidity()));
        }
        sensor.set_co2_button(true);
        sensor.set_humidity_button(true);
        for _ in 0..200 {
            assert!((1000..=4000).contains(&sensor.read_co2()));
            assert!((70..=100).contains(&sensor.read_humidity()));
        }
    }

    #[test]
    fn override_and_disconnect() {
        let sensor = seeded();
        sensor.set_temperature_override(Some(45));
        assert_eq!(sensor.read_temperature(), Ok(45));
        sensor.set_disconnected(true);
        assert!(matches!(
            sensor.read_temperature(),
            Err(DeviceError::Unavailable(_))
        ));
    }

    #[test]
    fn log_actuator_tracks_state() {
        let act = LogActuator::new();
        act.set(true).unwrap();
        assert!(act.is_on());
        act.set(false).unwrap();
        assert!(!act.is_on());
    }
}
