//! IAQ Common Library
//!
//! Shared types, constants and configuration for the indoor air quality
//! monitoring node workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Node defaults (periods, thresholds, capacities)
//! - [`reading`] - `Reading` snapshot, `MetricKind` and classification rules
//! - [`alert`] - `AlertBits` condition flags
//! - [`device`] - Sensor, reporting sink and actuator contracts
//! - [`config`] - Configuration loading traits and node configuration
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use iaq_common::prelude::*;
//!
//! let thresholds = Thresholds::default();
//! assert_eq!(thresholds.classify(MetricKind::Co2, 1501), ReadingStatus::Abnormal);
//! ```

pub mod alert;
pub mod config;
pub mod consts;
pub mod device;
pub mod prelude;
pub mod reading;
