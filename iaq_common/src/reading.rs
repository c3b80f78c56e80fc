//! Reading snapshot, metric identifiers and classification rules.
//!
//! A [`Reading`] is the composite value set carried by both channels. It is
//! `Copy` so that channel messages are always taken by value.

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;
use std::fmt;

use crate::consts::{CO2_HIGH_PPM, HUMIDITY_HIGH_PCT, TEMP_HIGH_C, TEMP_LOW_C};

/// Identifies one sampled metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Temperature [°C].
    Temperature,
    /// CO2 concentration [ppm].
    Co2,
    /// Relative humidity [%].
    Humidity,
}

impl MetricKind {
    /// All metrics, in reporting order.
    pub const ALL: [MetricKind; 3] = [Self::Temperature, Self::Co2, Self::Humidity];

    /// Number of metric kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Human readable name used in logs and sink identifiers.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Co2 => "CO2",
            Self::Humidity => "Humidity",
        }
    }

    /// Measurement unit suffix.
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "C",
            Self::Co2 => "ppm",
            Self::Humidity => "%",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification tag of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    /// All values within limits (or the snapshot is the routine one).
    #[default]
    Normal,
    /// Snapshot associated with an abnormal classification.
    Abnormal,
}

impl ReadingStatus {
    /// Returns true for [`ReadingStatus::Abnormal`].
    #[inline]
    pub const fn is_abnormal(self) -> bool {
        matches!(self, Self::Abnormal)
    }
}

/// Composite reading of all metrics.
///
/// Fields are written independently by the sampling worker that owns the
/// metric; fields not written in a cycle keep their previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature [°C].
    pub temperature: i32,
    /// Relative humidity [%].
    pub humidity: i32,
    /// CO2 concentration [ppm].
    pub co2: i32,
    /// Classification tag.
    pub status: ReadingStatus,
}

assert_impl_all!(Reading: Copy, Send, Sync);
assert_impl_all!(MetricKind: Copy, Send, Sync);

impl Reading {
    /// Zeroed reading with the given tag.
    pub const fn tagged(status: ReadingStatus) -> Self {
        Self {
            temperature: 0,
            humidity: 0,
            co2: 0,
            status,
        }
    }

    /// Value of one metric.
    #[inline]
    pub const fn get(&self, kind: MetricKind) -> i32 {
        match kind {
            MetricKind::Temperature => self.temperature,
            MetricKind::Co2 => self.co2,
            MetricKind::Humidity => self.humidity,
        }
    }

    /// Overwrite one metric, leaving the others untouched.
    #[inline]
    pub fn set(&mut self, kind: MetricKind, value: i32) {
        match kind {
            MetricKind::Temperature => self.temperature = value,
            MetricKind::Co2 => self.co2 = value,
            MetricKind::Humidity => self.humidity = value,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temp: {} C, CO2: {} ppm, Hum: {} %",
            self.temperature, self.co2, self.humidity
        )
    }
}

/// Classification limits.
///
/// Limits are exclusive: a value equal to a limit is normal.
///
/// # TOML Example
///
/// ```toml
/// [thresholds]
/// temp_low_c = 18
/// temp_high_c = 40
/// co2_high_ppm = 1500
/// humidity_high_pct = 90
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Temperature below this is abnormal [°C].
    pub temp_low_c: i32,
    /// Temperature above this is abnormal [°C].
    pub temp_high_c: i32,
    /// CO2 above this is abnormal [ppm].
    pub co2_high_ppm: i32,
    /// Humidity above this is abnormal [%].
    pub humidity_high_pct: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_low_c: TEMP_LOW_C,
            temp_high_c: TEMP_HIGH_C,
            co2_high_ppm: CO2_HIGH_PPM,
            humidity_high_pct: HUMIDITY_HIGH_PCT,
        }
    }
}

impl Thresholds {
    /// Classify one metric value.
    pub const fn classify(&self, kind: MetricKind, value: i32) -> ReadingStatus {
        let abnormal = match kind {
            MetricKind::Temperature => value > self.temp_high_c || value < self.temp_low_c,
            MetricKind::Co2 => value > self.co2_high_ppm,
            MetricKind::Humidity => value > self.humidity_high_pct,
        };
        if abnormal {
            ReadingStatus::Abnormal
        } else {
            ReadingStatus::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn temperature_boundaries() {
        let t = Thresholds::default();
        assert_eq!(t.classify(MetricKind::Temperature, 18), ReadingStatus::Normal);
        assert_eq!(t.classify(MetricKind::Temperature, 40), ReadingStatus::Normal);
        assert_eq!(t.classify(MetricKind::Temperature, 17), ReadingStatus::Abnormal);
        assert_eq!(t.classify(MetricKind::Temperature, 41), ReadingStatus::Abnormal);
    }

    #[test]
    fn co2_and_humidity_boundaries() {
        let t = Thresholds::default();
        assert_eq!(t.classify(MetricKind::Co2, 1500), ReadingStatus::Normal);
        assert_eq!(t.classify(MetricKind::Co2, 1501), ReadingStatus::Abnormal);
        assert_eq!(t.classify(MetricKind::Humidity, 90), ReadingStatus::Normal);
        assert_eq!(t.classify(MetricKind::Humidity, 91), ReadingStatus::Abnormal);
    }

    #[test]
    fn set_leaves_other_fields_untouched() {
        let mut r = Reading::tagged(ReadingStatus::Abnormal);
        r.set(MetricKind::Co2, 1200);
        r.set(MetricKind::Humidity, 55);
        r.set(MetricKind::Temperature, 21);
        r.set(MetricKind::Temperature, 23);
        assert_eq!(r.co2, 1200);
        assert_eq!(r.humidity, 55);
        assert_eq!(r.get(MetricKind::Temperature), 23);
        assert_eq!(r.status, ReadingStatus::Abnormal);
    }

    #[test]
    fn display_matches_log_format() {
        let r = Reading {
            temperature: 22,
            humidity: 45,
            co2: 600,
            status: ReadingStatus::Normal,
        };
        assert_eq!(r.to_string(), "Temp: 22 C, CO2: 600 ppm, Hum: 45 %");
    }

    proptest! {
        #[test]
        fn temperature_rule_holds(t in -100i32..200) {
            let abnormal = Thresholds::default()
                .classify(MetricKind::Temperature, t)
                .is_abnormal();
            prop_assert_eq!(abnormal, t > 40 || t < 18);
        }

        #[test]
        fn co2_rule_holds(c in 0i32..10_000) {
            prop_assert_eq!(
                Thresholds::default().classify(MetricKind::Co2, c).is_abnormal(),
                c > 1500
            );
        }

        #[test]
        fn humidity_rule_holds(h in 0i32..=100) {
            prop_assert_eq!(
                Thresholds::default().classify(MetricKind::Humidity, h).is_abnormal(),
                h > 90
            );
        }
    }
}
