//! # Task specification.
//!
//! Bundles a [`TaskRef`] with the nominal priority it would run at on a
//! priority-scheduled kernel (generator and receiver at 2, supervision at 1).
//! tokio does not schedule by priority; the value is carried for observability
//! and reported in the `TaskStarting` event.

use crate::tasks::task::TaskRef;

/// Specification for running a task under the system.
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    priority: u8,
}

impl TaskSpec {
    /// Creates a new task specification.
    pub fn new(task: TaskRef, priority: u8) -> Self {
        Self { task, priority }
    }

    /// Returns reference to the task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Convenience: returns the task name.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Returns the nominal priority.
    pub fn priority(&self) -> u8 {
        self.priority
    }
}
