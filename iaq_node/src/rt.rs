//! Real-time scheduling helpers.
//!
//! With the `rt` feature each worker thread switches itself to
//! `SCHED_FIFO` at its configured priority, and the process locks its
//! memory once at startup. Without the feature every call is a no-op, so
//! development builds run unprivileged.

use crate::error::NodeError;

/// Lock all current and future memory pages.
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
pub fn lock_memory() -> Result<(), NodeError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| NodeError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
pub fn lock_memory() -> Result<(), NodeError> {
    Ok(())
}

/// Switch the calling thread to `SCHED_FIFO` with `priority`.
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
pub fn set_thread_priority(priority: i32) -> Result<(), NodeError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // pid 0 = calling thread
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(NodeError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
pub fn set_thread_priority(_priority: i32) -> Result<(), NodeError> {
    Ok(())
}

/// True if the calling thread runs under a real-time policy.
pub fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        unsafe {
            let policy = sched_getscheduler(0);
            policy == SCHED_FIFO || policy == SCHED_RR
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

#[cfg(all(test, not(feature = "rt")))]
mod tests {
    use super::*;

    #[test]
    fn setup_is_noop_without_rt_feature() {
        assert!(lock_memory().is_ok());
        assert!(set_thread_priority(99).is_ok());
        // Test threads run under SCHED_OTHER.
        assert!(!detect_rt_mode());
    }
}
