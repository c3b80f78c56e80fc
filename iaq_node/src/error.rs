//! Error types of the sampling/alerting engine.
//!
//! Only [`NodeError`] ever leaves the engine: it reports unrecoverable
//! startup failures. [`StoreError`] and [`QueueError`] are recovered inside
//! the workers (skip the cycle, drop the message) and only logged.

use iaq_common::config::ConfigError;
use iaq_common::device::DeviceError;
use thiserror::Error;

/// Shared reading store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store lock was not acquired within the bounded wait.
    #[error("reading store lock not acquired within {timeout_ms}ms")]
    LockTimeout {
        /// Bounded wait that expired [ms].
        timeout_ms: u64,
    },
}

/// Bounded queue errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Nothing arrived within the bounded wait.
    #[error("no message within {timeout_ms}ms")]
    Timeout {
        /// Bounded wait that expired [ms].
        timeout_ms: u64,
    },
    /// The queue was closed for shutdown.
    #[error("queue closed")]
    Closed,
}

/// Node lifecycle errors.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration could not be loaded or validated.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A device backend could not be opened.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker '{worker}': {source}")]
    Spawn {
        /// Worker name.
        worker: &'static str,
        /// OS error.
        #[source]
        source: std::io::Error,
    },

    /// Real-time setup failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// `start()` called on a running node.
    #[error("node already running")]
    AlreadyRunning,

    /// `start()` called after `shutdown()`.
    #[error("node was shut down and cannot be restarted")]
    Stopped,

    /// A worker thread panicked.
    #[error("worker '{0}' panicked")]
    WorkerPanicked(&'static str),
}
