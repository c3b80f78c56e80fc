//! System-wide constants for the IAQ workspace.
//!
//! Single source of truth for the node defaults. Configuration sections
//! fall back to these values when a key is omitted.

/// Canonical service name (used for logging and the default config).
pub const NODE_SERVICE_NAME: &str = "iaq-node";

/// Sampling period of both sampling workers [ms].
pub const SAMPLE_PERIOD_MS: u64 = 200;

/// Bounded wait on the shared reading store lock [ms].
pub const LOCK_TIMEOUT_MS: u64 = 200;

/// Minimum interval between two reports of an unchanged value [ms].
pub const REPORT_INTERVAL_MS: u64 = 15_000;

/// Bounded wait of the alert responder on the alert channel [ms].
pub const ALERT_POP_TIMEOUT_MS: u64 = 500;

/// Duration of one actuator pulse [ms].
pub const BUZZER_PULSE_MS: u64 = 300;

/// Cool-down after each responder cycle [ms].
pub const ALERT_COOLDOWN_MS: u64 = 10_000;

/// Bounded wait of the display worker on the routine channel [ms].
pub const DISPLAY_POP_TIMEOUT_MS: u64 = 2_000;

/// Display worker period [ms].
pub const DISPLAY_PERIOD_MS: u64 = 5_000;

/// Routine channel capacity [messages].
pub const ROUTINE_CAPACITY: usize = 12;

/// Alert channel capacity [messages].
pub const ALERT_CAPACITY: usize = 6;

/// Temperature below this is abnormal [°C].
pub const TEMP_LOW_C: i32 = 18;

/// Temperature above this is abnormal [°C].
pub const TEMP_HIGH_C: i32 = 40;

/// CO2 above this is abnormal [ppm].
pub const CO2_HIGH_PPM: i32 = 1500;

/// Humidity above this is abnormal [%].
pub const HUMIDITY_HIGH_PCT: i32 = 90;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/iaq/node.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(TEMP_LOW_C < TEMP_HIGH_C);
        assert!(ROUTINE_CAPACITY > ALERT_CAPACITY);
        assert!(SAMPLE_PERIOD_MS > 0);
        assert!(BUZZER_PULSE_MS < ALERT_COOLDOWN_MS);
    }

    #[test]
    fn display_waits_less_than_its_period() {
        assert!(DISPLAY_POP_TIMEOUT_MS < DISPLAY_PERIOD_MS);
    }
}
