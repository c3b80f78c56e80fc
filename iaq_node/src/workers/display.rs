//! Low-priority display worker: logs the latest routine reading.

use iaq_common::config::TimingConfig;
use iaq_common::reading::Reading;
use std::time::Duration;
use tracing::{debug, info};

use crate::queue::RoutineQueue;
use crate::shutdown::ShutdownSignal;

/// Drains the routine channel at a slow, fixed pace.
pub struct DisplayWorker {
    routine: RoutineQueue,
    pop_timeout: Duration,
    period: Duration,
}

impl DisplayWorker {
    /// Worker name, also the thread name.
    pub const NAME: &'static str = "display";

    /// Create the worker draining `routine`.
    pub fn new(routine: RoutineQueue, timing: &TimingConfig) -> Self {
        Self {
            routine,
            pop_timeout: timing.display_pop_timeout(),
            period: timing.display_period(),
        }
    }

    /// Pop and log one reading, if any arrives in time.
    pub fn cycle(&self) -> Option<Reading> {
        match self.routine.pop_timeout(self.pop_timeout) {
            Ok(reading) => {
                info!("{reading}");
                Some(reading)
            }
            Err(e) => {
                debug!("Display: {e}");
                None
            }
        }
    }

    /// Display until shutdown. The period sleep follows every pop,
    /// successful or not.
    pub fn run(self, shutdown: ShutdownSignal) {
        info!("Display worker started ({}ms period)", self.period.as_millis());
        while !shutdown.is_triggered() {
            self.cycle();
            if !shutdown.sleep(self.period) {
                break;
            }
        }
        info!("Display worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iaq_common::reading::ReadingStatus;

    fn timing() -> TimingConfig {
        TimingConfig {
            display_pop_timeout_ms: 10,
            display_period_ms: 10,
            ..TimingConfig::default()
        }
    }

    #[test]
    fn pops_oldest_reading() {
        let q = RoutineQueue::new(4);
        let mut first = Reading::tagged(ReadingStatus::Normal);
        first.temperature = 21;
        q.push(first).unwrap();
        q.push(Reading::tagged(ReadingStatus::Normal)).unwrap();

        let w = DisplayWorker::new(q.clone(), &timing());
        assert_eq!(w.cycle().map(|r| r.temperature), Some(21));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn empty_channel_times_out_quietly() {
        let w = DisplayWorker::new(RoutineQueue::new(1), &timing());
        assert_eq!(w.cycle(), None);
    }
}
