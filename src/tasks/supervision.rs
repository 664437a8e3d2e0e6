//! # Supervision task (`TaskSupervision`).
//!
//! Purely observational: once per `supervision_delay` it reads **and clears**
//! both activity flags, looks up which tasks terminated themselves, and
//! publishes a `StatusReport`. It never touches the other tasks.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::flags::FlagSnapshot;
use crate::tasks::{Task, TaskContext};

/// Periodic health reporter.
pub struct Supervision {
    ctx: TaskContext,
    delay: Duration,
}

impl Supervision {
    pub const NAME: &'static str = "TaskSupervision";

    pub fn new(ctx: TaskContext, delay: Duration) -> Self {
        Self { ctx, delay }
    }

    /// One supervision cycle: sample, clear, publish.
    pub async fn report(&self) -> FlagSnapshot {
        let status = self.ctx.flags.take();
        let terminated = self.ctx.lifecycle.terminated().await;

        self.ctx.publish(
            Event::new(EventKind::StatusReport)
                .with_task(Self::NAME)
                .with_status(status)
                .with_terminated(terminated),
        );
        status
    }
}

#[async_trait]
impl Task for Supervision {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let wdt = self.ctx.watchdog.register(Self::NAME).await?;

        loop {
            self.report().await;
            wdt.reset();

            tokio::select! {
                _ = ctx.cancelled() => {
                    let _ = wdt.deregister().await;
                    return Err(TaskError::Canceled);
                }
                _ = time::sleep(self.delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::tests_support::context;

    #[tokio::test]
    async fn test_report_clears_flags() {
        let (ctx, mut events) = context();
        let sup = Supervision::new(ctx.clone(), Duration::from_millis(2000));

        ctx.flags.mark_generation();
        ctx.flags.set_reception(true);

        let first = sup.report().await;
        assert!(first.generation_ok && first.reception_ok);
        let second = sup.report().await;
        assert!(!second.generation_ok && !second.reception_ok);

        let ev = events.recv().await.expect("event");
        assert_eq!(
            ev.message(),
            "[SUPERVISÃO] Status :: Geração=[OK] | Recepção=[OK] | Watchdog=[ATIVO]"
        );
        let ev = events.recv().await.expect("event");
        assert_eq!(
            ev.message(),
            "[SUPERVISÃO] Status :: Geração=[FALHA] | Recepção=[FALHA] | Watchdog=[ATIVO]"
        );
    }

    #[tokio::test]
    async fn test_report_lists_terminated_tasks() {
        let (ctx, mut events) = context();
        ctx.lifecycle
            .update(&Event::new(EventKind::TaskStarting).with_task("TaskReceive"))
            .await;
        ctx.lifecycle
            .update(&Event::new(EventKind::TaskTerminated).with_task("TaskReceive"))
            .await;

        Supervision::new(ctx, Duration::from_millis(2000))
            .report()
            .await;
        let ev = events.recv().await.expect("event");
        assert!(ev.message().ends_with("| Watchdog=[ATIVO] | Encerradas=[TaskReceive]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_every_period() {
        let (ctx, mut events) = context();
        let sup = Supervision::new(ctx, Duration::from_millis(2000));
        let token = CancellationToken::new();

        let stopper = {
            let token = token.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(4500)).await;
                token.cancel();
            })
        };
        let res = sup.run(token).await;
        assert!(matches!(res, Err(TaskError::Canceled)));
        stopper.await.expect("join");

        let mut reports = 0;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::StatusReport {
                reports += 1;
            }
        }
        assert_eq!(reports, 3);
    }
}
