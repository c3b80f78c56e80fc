//! Linux sysfs backend.
//!
//! Temperature comes from an IIO raw ADC file wired to an MCP9700-class
//! analog sensor (500 mV at 0 °C, 10 mV/°C). CO2 and humidity have no
//! physical sensor on the reference board: two active-low GPIO buttons
//! select between the normal and alarm ranges of a pseudo-random stand-in.
//! The buzzer is a GPIO value file.
//!
//! | File | Content |
//! |------|---------|
//! | `temp_adc_raw` | raw ADC count, decimal |
//! | `co2_button`, `humidity_button` | `0` = pressed, `1` = released |
//! | `buzzer` | written `1` / `0` (inverted when `buzzer_active_low`) |

use iaq_common::config::SysfsConfig;
use iaq_common::device::{Actuator, DeviceError, SensorSource};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{co2_stand_in, humidity_stand_in};

/// Raw counts below this mean the sensor is disconnected.
pub const ADC_DISCONNECTED_RAW: i32 = 50;

/// Sensor output at 0 °C [mV].
const MCP9700_OFFSET_MV: f64 = 500.0;

/// Sensor slope [mV/°C].
const MCP9700_MV_PER_C: f64 = 10.0;

/// Convert a raw ADC count to whole degrees Celsius.
///
/// # Errors
/// `DeviceError::Unavailable` if `raw` is below [`ADC_DISCONNECTED_RAW`].
pub fn adc_to_celsius(raw: i32, scale_mv: f64) -> Result<i32, DeviceError> {
    if raw < ADC_DISCONNECTED_RAW {
        return Err(DeviceError::Unavailable(format!(
            "ADC raw {raw} below {ADC_DISCONNECTED_RAW}, sensor disconnected"
        )));
    }
    let millivolts = f64::from(raw) * scale_mv;
    Ok(((millivolts - MCP9700_OFFSET_MV) / MCP9700_MV_PER_C).round() as i32)
}

fn read_int(path: &Path) -> Result<i32, DeviceError> {
    let text = fs::read_to_string(path)
        .map_err(|e| DeviceError::Io(format!("{}: {e}", path.display())))?;
    text.trim()
        .parse()
        .map_err(|_| DeviceError::InvalidData(format!("{}: '{}'", path.display(), text.trim())))
}

fn require(path: &Path) -> Result<(), DeviceError> {
    if path.exists() {
        Ok(())
    } else {
        Err(DeviceError::InitFailed(format!("{} does not exist", path.display())))
    }
}

/// Sensor source backed by sysfs files.
#[derive(Debug)]
pub struct SysfsSensor {
    temp_adc_raw: PathBuf,
    adc_scale_mv: f64,
    co2_button: PathBuf,
    humidity_button: PathBuf,
    rng: Mutex<StdRng>,
}

impl SysfsSensor {
    /// Open the sensor files.
    ///
    /// # Errors
    /// `DeviceError::InitFailed` if any configured file is missing.
    pub fn open(config: &SysfsConfig) -> Result<Self, DeviceError> {
        require(&config.temp_adc_raw)?;
        require(&config.co2_button)?;
        require(&config.humidity_button)?;
        info!(
            "Sysfs sensors: adc={}, co2_button={}, humidity_button={}",
            config.temp_adc_raw.display(),
            config.co2_button.display(),
            config.humidity_button.display()
        );
        Ok(Self {
            temp_adc_raw: config.temp_adc_raw.clone(),
            adc_scale_mv: config.adc_scale_mv,
            co2_button: config.co2_button.clone(),
            humidity_button: config.humidity_button.clone(),
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Active-low button; unreadable files count as released.
    fn pressed(path: &Path) -> bool {
        match read_int(path) {
            Ok(level) => level == 0,
            Err(e) => {
                debug!("Button read failed, assuming released: {e}");
                false
            }
        }
    }
}

impl SensorSource for SysfsSensor {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn read_temperature(&self) -> Result<i32, DeviceError> {
        let raw = read_int(&self.temp_adc_raw)
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        adc_to_celsius(raw, self.adc_scale_mv)
    }

    fn read_co2(&self) -> i32 {
        co2_stand_in(&mut *self.rng.lock(), Self::pressed(&self.co2_button))
    }

    fn read_humidity(&self) -> i32 {
        humidity_stand_in(&mut *self.rng.lock(), Self::pressed(&self.humidity_button))
    }
}

/// Buzzer on a GPIO value file.
#[derive(Debug)]
pub struct GpioActuator {
    value: PathBuf,
    active_low: bool,
}

impl GpioActuator {
    /// Open the output and drive it to the off level.
    ///
    /// # Errors
    /// `DeviceError::InitFailed` if the value file is missing,
    /// `DeviceError::Io` if it cannot be written.
    pub fn open(config: &SysfsConfig) -> Result<Self, DeviceError> {
        require(&config.buzzer)?;
        let act = Self {
            value: config.buzzer.clone(),
            active_low: config.buzzer_active_low,
        };
        act.set(false)?;
        Ok(act)
    }
}

impl Actuator for GpioActuator {
    fn set(&self, on: bool) -> Result<(), DeviceError> {
        let level = on != self.active_low;
        fs::write(&self.value, if level { "1" } else { "0" })
            .map_err(|e| DeviceError::Io(format!("{}: {e}", self.value.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn board(dir: &TempDir, raw: &str) -> SysfsConfig {
        let cfg = SysfsConfig {
            temp_adc_raw: dir.path().join("in_voltage1_raw"),
            adc_scale_mv: 0.4275,
            co2_button: dir.path().join("gpio2"),
            humidity_button: dir.path().join("gpio4"),
            buzzer: dir.path().join("gpio8"),
            buzzer_active_low: false,
        };
        fs::write(&cfg.temp_adc_raw, raw).unwrap();
        fs::write(&cfg.co2_button, "1\n").unwrap();
        fs::write(&cfg.humidity_button, "1\n").unwrap();
        fs::write(&cfg.buzzer, "0").unwrap();
        cfg
    }

    #[test]
    fn adc_conversion_rounds_to_nearest() {
        // 1755 * 0.4275 = 750.26 mV -> 25.03 C
        assert_eq!(adc_to_celsius(1755, 0.4275), Ok(25));
        // 1000 mV -> 50 C
        assert_eq!(adc_to_celsius(1000, 1.0), Ok(50));
        // 1005 mV -> 50.5 C rounds away from zero
        assert_eq!(adc_to_celsius(1005, 1.0), Ok(51));
    }

    #[test]
    fn low_raw_means_disconnected() {
        assert!(matches!(adc_to_celsius(49, 0.4275), Err(DeviceError::Unavailable(_))));
        assert!(adc_to_celsius(50, 1.0).is_ok());
    }

    #[test]
    fn reads_temperature_from_file() {
        let dir = TempDir::new().unwrap();
        let sensor = SysfsSensor::open(&board(&dir, "1755\n")).unwrap();
        assert_eq!(sensor.read_temperature(), Ok(25));
    }

    #[test]
    fn garbage_adc_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let sensor = SysfsSensor::open(&board(&dir, "n/a")).unwrap();
        assert!(matches!(sensor.read_temperature(), Err(DeviceError::Unavailable(_))));
    }

    #[test]
    fn pressed_button_selects_alarm_range() {
        let dir = TempDir::new().unwrap();
        let cfg = board(&dir, "1755");
        let sensor = SysfsSensor::open(&cfg).unwrap();
        assert!(sensor.read_co2() <= 1000);

        fs::write(&cfg.co2_button, "0\n").unwrap();
        fs::write(&cfg.humidity_button, "0\n").unwrap();
        assert!(sensor.read_co2() >= 1000);
        assert!(sensor.read_humidity() >= 70);
    }

    #[test]
    fn missing_file_fails_open() {
        let dir = TempDir::new().unwrap();
        let mut cfg = board(&dir, "1755");
        cfg.temp_adc_raw = dir.path().join("absent");
        assert!(matches!(SysfsSensor::open(&cfg), Err(DeviceError::InitFailed(_))));
    }

    #[test]
    fn actuator_honours_active_low() {
        let dir = TempDir::new().unwrap();
        let mut cfg = board(&dir, "1755");
        cfg.buzzer_active_low = true;
        let act = GpioActuator::open(&cfg).unwrap();
        assert_eq!(fs::read_to_string(&cfg.buzzer).unwrap(), "1");
        act.set(true).unwrap();
        assert_eq!(fs::read_to_string(&cfg.buzzer).unwrap(), "0");
    }
}
