use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// External supervision for a `train` call.
///
/// Training loops poll `should_stop` at every epoch boundary and return early
/// once it is `true`. Two triggers exist:
/// - `stop_flag`: an atomic flag another thread may set (see `stop_handle`)
/// - `deadline`: an optional wall-clock instant after which no new epoch starts
#[derive(Debug, Clone, Default)]
pub struct TrainControl {
    stop_flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl TrainControl {
    /// A control that never stops on its own.
    pub fn new() -> Self {
        TrainControl::default()
    }

    /// Stops training at the first epoch boundary after `limit` has elapsed.
    pub fn with_time_limit(self, limit: Option<Duration>) -> Self {
        TrainControl {
            deadline: limit.map(|l| Instant::now() + l),
            ..self
        }
    }

    /// Shared flag; storing `true` requests a stop at the next epoch boundary.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    pub fn should_stop(&self) -> bool {
        if self.stop_flag.load(Ordering::Relaxed) {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }
}
