//! Deterministic test doubles.
//!
//! [`ScriptedSensor`] replays fixed value sequences (repeating the last
//! value once a script is exhausted) and [`RecordingActuator`] records
//! every output change. Both are used by the worker unit tests and the
//! integration scenarios.

use iaq_common::device::{Actuator, DeviceError, ReportingSink, SensorSource};
use iaq_common::reading::MetricKind;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug)]
struct Script<T: Clone> {
    pending: VecDeque<T>,
    last: T,
}

impl<T: Clone> Script<T> {
    fn constant(value: T) -> Self {
        Self {
            pending: VecDeque::new(),
            last: value,
        }
    }

    fn replace(&mut self, values: impl IntoIterator<Item = T>) {
        self.pending = values.into_iter().collect();
    }

    fn next(&mut self) -> T {
        if let Some(v) = self.pending.pop_front() {
            self.last = v;
        }
        self.last.clone()
    }
}

/// Sensor source replaying scripted values.
#[derive(Debug)]
pub struct ScriptedSensor {
    temperature: Mutex<Script<Result<i32, DeviceError>>>,
    co2: Mutex<Script<i32>>,
    humidity: Mutex<Script<i32>>,
    temperature_reads: AtomicUsize,
}

impl Default for ScriptedSensor {
    fn default() -> Self {
        Self::new(22, 600, 45)
    }
}

impl ScriptedSensor {
    /// Constant readings.
    pub fn new(temperature: i32, co2: i32, humidity: i32) -> Self {
        Self {
            temperature: Mutex::new(Script::constant(Ok(temperature))),
            co2: Mutex::new(Script::constant(co2)),
            humidity: Mutex::new(Script::constant(humidity)),
            temperature_reads: AtomicUsize::new(0),
        }
    }

    /// Queue temperature values.
    pub fn with_temperatures(self, values: impl IntoIterator<Item = i32>) -> Self {
        self.temperature.lock().replace(values.into_iter().map(Ok));
        self
    }

    /// Queue temperature results, including unavailable reads.
    pub fn with_temperature_results(
        self,
        values: impl IntoIterator<Item = Result<i32, DeviceError>>,
    ) -> Self {
        self.temperature.lock().replace(values);
        self
    }

    /// Queue CO2 values.
    pub fn with_co2(self, values: impl IntoIterator<Item = i32>) -> Self {
        self.co2.lock().replace(values);
        self
    }

    /// Queue humidity values.
    pub fn with_humidity(self, values: impl IntoIterator<Item = i32>) -> Self {
        self.humidity.lock().replace(values);
        self
    }

    /// Number of temperature reads so far.
    pub fn temperature_reads(&self) -> usize {
        self.temperature_reads.load(Ordering::Relaxed)
    }
}

impl SensorSource for ScriptedSensor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn read_temperature(&self) -> Result<i32, DeviceError> {
        self.temperature_reads.fetch_add(1, Ordering::Relaxed);
        self.temperature.lock().next()
    }

    fn read_co2(&self) -> i32 {
        self.co2.lock().next()
    }

    fn read_humidity(&self) -> i32 {
        self.humidity.lock().next()
    }
}

/// Actuator recording every `set` call.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    events: Mutex<Vec<bool>>,
    on: AtomicBool,
}

impl RecordingActuator {
    /// Empty recorder, output off.
    pub fn new() -> Self {
        Self::default()
    }

    /// All `set` calls, in order.
    pub fn events(&self) -> Vec<bool> {
        self.events.lock().clone()
    }

    /// Number of off→on transitions.
    pub fn pulses(&self) -> usize {
        let events = self.events.lock();
        let mut prev = false;
        let mut count = 0;
        for &on in events.iter() {
            if on && !prev {
                count += 1;
            }
            prev = on;
        }
        count
    }

    /// Current output state.
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }
}

impl Actuator for RecordingActuator {
    fn set(&self, on: bool) -> Result<(), DeviceError> {
        self.events.lock().push(on);
        self.on.store(on, Ordering::Release);
        Ok(())
    }
}

/// Sink that discards everything; handy where reports are irrelevant.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportingSink for NullSink {
    fn report(&self, _metric: MetricKind, _value: i32) {}

    fn report_alert(&self, _metric: MetricKind, _active: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_repeats_last_value() {
        let sensor = ScriptedSensor::default().with_temperatures([20, 45]);
        assert_eq!(sensor.read_temperature(), Ok(20));
        assert_eq!(sensor.read_temperature(), Ok(45));
        assert_eq!(sensor.read_temperature(), Ok(45));
        assert_eq!(sensor.temperature_reads(), 3);
    }

    #[test]
    fn unavailable_results_are_replayed() {
        let sensor = ScriptedSensor::default().with_temperature_results([
            Err(DeviceError::Unavailable("raw=3".into())),
            Ok(21),
        ]);
        assert!(sensor.read_temperature().is_err());
        assert_eq!(sensor.read_temperature(), Ok(21));
    }

    #[test]
    fn actuator_counts_pulses() {
        let act = RecordingActuator::new();
        act.set(true).unwrap();
        act.set(false).unwrap();
        act.set(false).unwrap();
        act.set(true).unwrap();
        assert_eq!(act.pulses(), 2);
        assert!(act.is_on());
    }
}
