use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::monitor::Watchdog;
use crate::error::WatchdogError;

/// Liveness handle returned by [`Watchdog::register`].
///
/// Owned by the task that registered; not `Clone`.
#[derive(Debug)]
pub struct WatchdogHandle {
    pub(super) name: Arc<str>,
    pub(super) last_reset: Arc<AtomicU64>,
    pub(super) watchdog: Arc<Watchdog>,
}

impl WatchdogHandle {
    /// Registered task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signals liveness: restarts this task's deadline.
    pub fn reset(&self) {
        self.last_reset
            .store(self.watchdog.now_ms(), Ordering::Release);
    }

    /// Removes the registration; the monitor stops watching this task.
    pub async fn deregister(self) -> Result<(), WatchdogError> {
        let watchdog = Arc::clone(&self.watchdog);
        watchdog.remove(&self).await
    }
}
