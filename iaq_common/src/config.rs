//! Configuration loading traits and node configuration.
//!
//! This module provides a standardized way to load the node's TOML
//! configuration. Every section falls back to the node defaults in
//! [`crate::consts`], so an empty file is a valid configuration.
//!
//! # Usage
//!
//! ```rust,no_run
//! use iaq_common::config::{ConfigLoader, ConfigError, NodeConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = NodeConfig::load(Path::new("node.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::consts::{
    ALERT_CAPACITY, ALERT_COOLDOWN_MS, ALERT_POP_TIMEOUT_MS, BUZZER_PULSE_MS,
    DISPLAY_PERIOD_MS, DISPLAY_POP_TIMEOUT_MS, LOCK_TIMEOUT_MS, NODE_SERVICE_NAME,
    REPORT_INTERVAL_MS, ROUTINE_CAPACITY, SAMPLE_PERIOD_MS,
};
use crate::reading::Thresholds;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "iaq-node-livingroom"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Node instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    NODE_SERVICE_NAME.to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Worker periods and bounded waits, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Sampling period of both sampling workers.
    pub sample_period_ms: u64,
    /// Bounded wait on the shared store lock.
    pub lock_timeout_ms: u64,
    /// Minimum interval between reports of an unchanged value.
    pub report_interval_ms: u64,
    /// Responder's bounded wait on the alert channel.
    pub alert_pop_timeout_ms: u64,
    /// Actuator pulse length.
    pub buzzer_pulse_ms: u64,
    /// Responder cool-down after each cycle.
    pub alert_cooldown_ms: u64,
    /// Display worker's bounded wait on the routine channel.
    pub display_pop_timeout_ms: u64,
    /// Display worker period.
    pub display_period_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: SAMPLE_PERIOD_MS,
            lock_timeout_ms: LOCK_TIMEOUT_MS,
            report_interval_ms: REPORT_INTERVAL_MS,
            alert_pop_timeout_ms: ALERT_POP_TIMEOUT_MS,
            buzzer_pulse_ms: BUZZER_PULSE_MS,
            alert_cooldown_ms: ALERT_COOLDOWN_MS,
            display_pop_timeout_ms: DISPLAY_POP_TIMEOUT_MS,
            display_period_ms: DISPLAY_PERIOD_MS,
        }
    }
}

impl TimingConfig {
    /// Sampling period.
    pub const fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    /// Store lock timeout.
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Report interval.
    pub const fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    /// Responder pop timeout.
    pub const fn alert_pop_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_pop_timeout_ms)
    }

    /// Actuator pulse length.
    pub const fn buzzer_pulse(&self) -> Duration {
        Duration::from_millis(self.buzzer_pulse_ms)
    }

    /// Responder cool-down.
    pub const fn alert_cooldown(&self) -> Duration {
        Duration::from_millis(self.alert_cooldown_ms)
    }

    /// Display pop timeout.
    pub const fn display_pop_timeout(&self) -> Duration {
        Duration::from_millis(self.display_pop_timeout_ms)
    }

    /// Display period.
    pub const fn display_period(&self) -> Duration {
        Duration::from_millis(self.display_period_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("sample_period_ms", self.sample_period_ms),
            ("lock_timeout_ms", self.lock_timeout_ms),
            ("alert_pop_timeout_ms", self.alert_pop_timeout_ms),
            ("display_pop_timeout_ms", self.display_pop_timeout_ms),
            ("display_period_ms", self.display_period_ms),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "timing.{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

/// Bounded channel capacities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Routine channel capacity (drop-on-full).
    pub routine_capacity: usize,
    /// Alert channel capacity (block-on-full).
    pub alert_capacity: usize,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            routine_capacity: ROUTINE_CAPACITY,
            alert_capacity: ALERT_CAPACITY,
        }
    }
}

/// Alert responder behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// Put the taken alert bits back when the alert channel pop times out.
    pub rearm_on_timeout: bool,
}

/// Sensor/actuator backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Software sensors and a logging actuator.
    #[default]
    Simulation,
    /// Linux sysfs ADC and GPIO files.
    Sysfs,
}

/// Simulation backend settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Temperature the random walk starts from [°C].
    pub base_temp_c: i32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            base_temp_c: 22,
        }
    }
}

/// Sysfs backend settings.
///
/// # TOML Example
///
/// ```toml
/// [driver.sysfs]
/// temp_adc_raw = "/sys/bus/iio/devices/iio:device0/in_voltage1_raw"
/// adc_scale_mv = 0.4275
/// co2_button = "/sys/class/gpio/gpio2/value"
/// humidity_button = "/sys/class/gpio/gpio4/value"
/// buzzer = "/sys/class/gpio/gpio8/value"
/// buzzer_active_low = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysfsConfig {
    /// Raw ADC sample file of the temperature channel.
    pub temp_adc_raw: PathBuf,
    /// Millivolts per raw ADC count.
    pub adc_scale_mv: f64,
    /// Active-low CO2 stand-in button value file.
    pub co2_button: PathBuf,
    /// Active-low humidity stand-in button value file.
    pub humidity_button: PathBuf,
    /// Buzzer output value file.
    pub buzzer: PathBuf,
    /// Buzzer sounds when the line is driven low (relay boards).
    pub buzzer_active_low: bool,
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            temp_adc_raw: PathBuf::from("/sys/bus/iio/devices/iio:device0/in_voltage1_raw"),
            adc_scale_mv: 0.4275,
            co2_button: PathBuf::from("/sys/class/gpio/gpio2/value"),
            humidity_button: PathBuf::from("/sys/class/gpio/gpio4/value"),
            buzzer: PathBuf::from("/sys/class/gpio/gpio8/value"),
            buzzer_active_low: false,
        }
    }
}

/// Driver section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Selected backend.
    pub backend: Backend,
    /// Simulation backend settings.
    pub simulation: SimulationConfig,
    /// Sysfs backend settings.
    pub sysfs: SysfsConfig,
}

/// Per-worker SCHED_FIFO priorities (applied with the `rt` feature only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Temperature sampling worker.
    pub temperature_priority: i32,
    /// CO2/humidity sampling worker.
    pub co2_humidity_priority: i32,
    /// Alert responder.
    pub responder_priority: i32,
    /// Display worker.
    pub display_priority: i32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            temperature_priority: 5,
            co2_humidity_priority: 5,
            responder_priority: 4,
            display_priority: 1,
        }
    }
}

impl SchedulingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let all = [
            self.temperature_priority,
            self.co2_humidity_priority,
            self.responder_priority,
            self.display_priority,
        ];
        if all.iter().any(|p| !(1..=99).contains(p)) {
            return Err(ConfigError::ValidationError(
                "scheduling priorities must be within 1..=99".to_string(),
            ));
        }
        Ok(())
    }
}

/// Root node configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "iaq-node"
///
/// [timing]
/// sample_period_ms = 200
///
/// [driver]
/// backend = "simulation"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Common fields.
    pub shared: SharedConfig,
    /// Periods and bounded waits.
    pub timing: TimingConfig,
    /// Classification limits.
    pub thresholds: Thresholds,
    /// Channel capacities.
    pub channels: ChannelsConfig,
    /// Alert responder behaviour.
    pub responder: ResponderConfig,
    /// Backend selection.
    pub driver: DriverConfig,
    /// Worker priorities.
    pub scheduling: SchedulingConfig,
}

impl NodeConfig {
    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    /// - a period or bounded wait is zero
    /// - a channel capacity is zero
    /// - `temp_low_c` is greater than `temp_high_c`
    /// - a scheduling priority is outside `1..=99`
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.timing.validate()?;

        if self.channels.routine_capacity == 0 || self.channels.alert_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "channel capacities must be greater than zero".to_string(),
            ));
        }

        if self.thresholds.temp_low_c > self.thresholds.temp_high_c {
            return Err(ConfigError::ValidationError(format!(
                "temp_low_c ({}) is above temp_high_c ({})",
                self.thresholds.temp_low_c, self.thresholds.temp_high_c
            )));
        }

        if self.driver.backend == Backend::Sysfs && self.driver.sysfs.adc_scale_mv <= 0.0 {
            return Err(ConfigError::ValidationError(
                "driver.sysfs.adc_scale_mv must be positive".to_string(),
            ));
        }

        self.scheduling.validate()
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        let parsed: TestWrapper = toml::from_str("level = \"trace\"").unwrap();
        assert_eq!(parsed.level, LogLevel::Trace);
        let parsed: TestWrapper = toml::from_str("level = \"error\"").unwrap();
        assert_eq!(parsed.level, LogLevel::Error);
    }

    #[test]
    fn test_empty_config_uses_node_defaults() {
        let config = NodeConfig::from_toml("").unwrap();
        assert_eq!(config.shared.service_name, NODE_SERVICE_NAME);
        assert_eq!(config.timing.sample_period_ms, 200);
        assert_eq!(config.timing.report_interval_ms, 15_000);
        assert_eq!(config.timing.alert_cooldown_ms, 10_000);
        assert_eq!(config.channels.routine_capacity, 12);
        assert_eq!(config.channels.alert_capacity, 6);
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.driver.backend, Backend::Simulation);
        assert!(!config.responder.rearm_on_timeout);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = NodeConfig::from_toml(
            r#"
[timing]
sample_period_ms = 50

[thresholds]
co2_high_ppm = 1000
"#,
        )
        .unwrap();
        assert_eq!(config.timing.sample_period_ms, 50);
        assert_eq!(config.timing.lock_timeout_ms, LOCK_TIMEOUT_MS);
        assert_eq!(config.thresholds.co2_high_ppm, 1000);
        assert_eq!(config.thresholds.temp_high_c, 40);
    }

    #[test]
    fn test_validation_rejects_empty_service_name() {
        let mut config = NodeConfig::default();
        config.shared.service_name.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_rejects_zero_period() {
        let mut config = NodeConfig::default();
        config.timing.sample_period_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sample_period_ms"));
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let mut config = NodeConfig::default();
        config.channels.alert_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_temperature_band() {
        let mut config = NodeConfig::default();
        config.thresholds.temp_low_c = 45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_priority() {
        let mut config = NodeConfig::default();
        config.scheduling.display_priority = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = NodeConfig::load(Path::new("/nonexistent/path/node.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = NodeConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_loader_success() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[shared]
log_level = "debug"
service_name = "iaq-test"

[driver]
backend = "sysfs"

[driver.sysfs]
buzzer = "/tmp/buzzer"
buzzer_active_low = true

[responder]
rearm_on_timeout = true
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = NodeConfig::load(file.path()).unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, "iaq-test");
        assert_eq!(config.driver.backend, Backend::Sysfs);
        assert_eq!(config.driver.sysfs.buzzer, PathBuf::from("/tmp/buzzer"));
        assert!(config.driver.sysfs.buzzer_active_low);
        assert_eq!(
            config.driver.sysfs.co2_button,
            SysfsConfig::default().co2_button
        );
        assert!(config.responder.rearm_on_timeout);
        assert!(config.validate().is_ok());
    }
}
