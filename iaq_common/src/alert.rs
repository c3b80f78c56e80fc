//! Alert condition flags.
//!
//! One bit per metric plus a `NORMAL` bit. Sampling workers set bits, the
//! alert responder waits on the metric bits and takes them atomically.

use bitflags::bitflags;
use heapless::Vec;

use crate::reading::MetricKind;

bitflags! {
    /// Pending alert causes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AlertBits: u8 {
        /// Temperature out of range.
        const TEMPERATURE = 0x01;
        /// CO2 above limit.
        const CO2         = 0x02;
        /// Humidity above limit.
        const HUMIDITY    = 0x04;
        /// A sampling cycle classified normal. Never waited on.
        const NORMAL      = 0x08;
    }
}

impl AlertBits {
    /// Bits that wake the alert responder.
    pub const ALERT_MASK: Self = Self::from_bits_truncate(
        Self::TEMPERATURE.bits() | Self::CO2.bits() | Self::HUMIDITY.bits(),
    );

    /// Bit for one metric.
    #[inline]
    pub const fn for_metric(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Temperature => Self::TEMPERATURE,
            MetricKind::Co2 => Self::CO2,
            MetricKind::Humidity => Self::HUMIDITY,
        }
    }

    /// Returns true if any metric alert bit is set.
    #[inline]
    pub const fn has_alert(&self) -> bool {
        self.intersects(Self::ALERT_MASK)
    }

    /// Metrics whose alert bit is set, in [`MetricKind::ALL`] order.
    pub fn metrics(&self) -> Vec<MetricKind, { MetricKind::COUNT }> {
        let mut out = Vec::new();
        for kind in MetricKind::ALL {
            if self.contains(Self::for_metric(kind)) {
                // Capacity equals the number of metric kinds.
                let _ = out.push(kind);
            }
        }
        out
    }
}

impl Default for AlertBits {
    fn default() -> Self {
        Self::empty()
    }
}
