use std::sync::Arc;

use crate::core::LifecycleTracker;
use crate::events::{Bus, Event};
use crate::flags::ActivityFlags;
use crate::watchdog::Watchdog;

/// State shared by every task, handed over at construction time.
///
/// Queue halves are not part of the context: each is given only to the task
/// that uses it (sender to the generator, receiver to the receiver).
#[derive(Clone, Debug)]
pub struct TaskContext {
    /// Event bus; all task output goes through it.
    pub bus: Bus,
    /// Watchdog every task registers with.
    pub watchdog: Arc<Watchdog>,
    /// Activity flags.
    pub flags: ActivityFlags,
    /// Task lifecycle states, read by the supervision task.
    pub lifecycle: Arc<LifecycleTracker>,
}

impl TaskContext {
    #[inline]
    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }
}
