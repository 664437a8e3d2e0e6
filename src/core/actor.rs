//! # TaskActor: runs one task and reports how it ended.
//!
//! ## Event flow
//! ```text
//! TaskStarting ─► task.run(child_token)
//!                    ├─ Ok(())                 → TaskStopped
//!                    ├─ Err(Canceled)          → TaskStopped
//!                    └─ Err(Fatal { error })   → TaskTerminated (reason = error)
//! ```
//!
//! ## Rules
//! - Exactly **one** terminal event per actor.
//! - Tasks are never restarted: a terminated task stays terminated and the
//!   rest of the system keeps running.
//! - Each actor gets a **child token**; cancelling it does not affect siblings.

use tokio_util::sync::CancellationToken;

use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    tasks::{TaskRef, TaskSpec},
};

/// How an actor ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExit {
    /// Returned normally or observed cancellation.
    Stopped,
    /// Task gave up on its own.
    Terminated,
}

/// Drives a single [`TaskSpec`] and publishes its lifecycle.
pub struct TaskActor {
    task: TaskRef,
    priority: u8,
    bus: Bus,
}

impl TaskActor {
    /// Creates a new task actor.
    pub fn new(spec: &TaskSpec, bus: Bus) -> Self {
        Self {
            task: spec.task().clone(),
            priority: spec.priority(),
            bus,
        }
    }

    /// Runs the task to its end.
    pub async fn run(self, token: CancellationToken) -> ActorExit {
        let name = self.task.name().to_string();
        self.bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(name.as_str())
                .with_priority(self.priority),
        );

        match self.task.run(token).await {
            Ok(()) | Err(TaskError::Canceled) => {
                self.bus
                    .publish(Event::new(EventKind::TaskStopped).with_task(name.as_str()));
                ActorExit::Stopped
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::TaskTerminated)
                        .with_task(name.as_str())
                        .with_reason(e.to_string()),
                );
                ActorExit::Terminated
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::Task;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Quits(bool);

    #[async_trait]
    impl Task for Quits {
        fn name(&self) -> &str {
            "quits"
        }

        async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
            if self.0 {
                return Err(TaskError::Fatal {
                    error: "gave up".into(),
                });
            }
            ctx.cancelled().await;
            Err(TaskError::Canceled)
        }
    }

    #[tokio::test]
    async fn test_fatal_exit_publishes_terminated() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let spec = TaskSpec::new(Arc::new(Quits(true)), 2);

        let exit = TaskActor::new(&spec, bus).run(CancellationToken::new()).await;
        assert_eq!(exit, ActorExit::Terminated);

        let starting = rx.recv().await.expect("starting");
        assert_eq!(starting.kind, EventKind::TaskStarting);
        assert_eq!(starting.priority, Some(2));
        let end = rx.recv().await.expect("end");
        assert_eq!(end.kind, EventKind::TaskTerminated);
        assert_eq!(end.reason.as_deref(), Some("fatal error: gave up"));
    }

    #[tokio::test]
    async fn test_cancel_publishes_stopped() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let spec = TaskSpec::new(Arc::new(Quits(false)), 1);
        let token = CancellationToken::new();
        token.cancel();

        let exit = TaskActor::new(&spec, bus).run(token).await;
        assert_eq!(exit, ActorExit::Stopped);
        let _starting = rx.recv().await.expect("starting");
        assert_eq!(rx.recv().await.expect("end").kind, EventKind::TaskStopped);
    }
}
