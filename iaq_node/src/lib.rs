//! # IAQ Node Library
//!
//! Concurrent sampling, alerting and rate-limited reporting engine of the
//! indoor air quality monitoring node.
//!
//! # Module Structure
//!
//! - [`store`] - lock-guarded routine/abnormal snapshots
//! - [`queue`] - bounded FIFO with drop-on-full or block-on-full policy
//! - [`flags`] - alert bits with wait-and-take
//! - [`rate_limit`] - per-metric report gate
//! - [`workers`] - sampling workers, alert responder, display worker
//! - [`drivers`] - sensor/actuator backends and reporting sinks
//! - [`node`] - `MonitorNode` lifecycle
//! - [`rt`] - SCHED_FIFO priorities and memory locking (`rt` feature)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          MonitorNode                             │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐  │
//! │  │ Temperature  │──►│ ReadingStore │   │ RoutineQueue (12)    │──┼─► Display
//! │  │ worker       │──►│  (mutex)     │   │ drop on full         │  │
//! │  └──────────────┘   └──────────────┘   └──────────────────────┘  │
//! │  ┌──────────────┐          ▲           ┌──────────────────────┐  │
//! │  │ CO2/humidity │──────────┘           │ AlertQueue (6)       │──┼─► Responder ─► Actuator
//! │  │ worker       │─────────────────────►│ block on full        │  │       │
//! │  └──────────────┘─────► AlertFlags ────┴──────────────────────┘  │       ▼
//! │        │                                                          │  ReportingSink
//! │        └── RateLimiter ──────────────────────────────────────────┼─► ReportingSink
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod drivers;
pub mod error;
pub mod flags;
pub mod node;
pub mod queue;
pub mod rate_limit;
pub mod rt;
pub mod shutdown;
pub mod store;
pub mod workers;

// Re-export key types for convenience
pub use crate::drivers::DeviceSet;
pub use crate::error::{NodeError, QueueError, StoreError};
pub use crate::node::{MonitorNode, NodeStats};
pub use crate::shutdown::ShutdownSignal;
