//! # Receiver task (`TaskReceive`).
//!
//! Consumes the queue with a timeout and performs one bounded recovery wait
//! before giving up for good.
//!
//! ## States
//! ```text
//!             recv ok (≤ reception_timeout)
//!            ┌───────────────┐
//!            ▼               │
//!        ┌─────────┐ ────────┘
//!  ────► │ Waiting │ ── timeout ──► warn, "recovering", sleep(recovery_pause)
//!        └─────────┘                            │
//!            ▲                                  ▼
//!            │ recv ok (≤ recovery_timeout) ┌────────────┐
//!            └───────────────────────────── │ Recovering │
//!                                           └────────────┘
//!                                                 │ timeout
//!                                                 ▼
//!                                           ┌────────────┐
//!                                           │ Terminated │ → deregister, exit (fatal)
//!                                           └────────────┘
//! ```
//!
//! ## Rules
//! - The watchdog is reset each time the machine returns to `Waiting`, i.e. once per
//!   full loop body; the longest gap is `reception_timeout + recovery_pause + recovery_timeout`.
//! - A received value is copied into a transient heap slot with fallible allocation;
//!   on failure the error is reported and `reception_ok` is left untouched.
//! - A persistent failure clears `reception_ok`, deregisters from the watchdog,
//!   publishes `ReceiverFailed` as its last event and returns `TaskError::Fatal`.
//!   The `TaskTerminated` that follows comes from the actor, not from this task.

use std::collections::TryReserveError;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::queue::QueueReceiver;
use crate::tasks::{Task, TaskContext};

/// Receiver state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiverState {
    Waiting,
    Recovering,
    Terminated,
}

/// Receiver timing parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiverTiming {
    /// Wait in `Waiting`.
    pub reception_timeout: Duration,
    /// Sleep between a timeout and the recovery wait.
    pub recovery_pause: Duration,
    /// Wait in `Recovering`.
    pub recovery_timeout: Duration,
}

impl From<&Config> for ReceiverTiming {
    fn from(cfg: &Config) -> Self {
        Self {
            reception_timeout: cfg.reception_timeout,
            recovery_pause: cfg.recovery_pause,
            recovery_timeout: cfg.recovery_timeout,
        }
    }
}

/// Consumer with timeout-based recovery.
pub struct Receiver {
    ctx: TaskContext,
    queue: QueueReceiver<i32>,
    timing: ReceiverTiming,
}

/// Copies `value` into a freshly allocated slot, reporting allocation failure.
fn copy_to_heap(value: i32) -> Result<Vec<i32>, TryReserveError> {
    let mut slot = Vec::new();
    slot.try_reserve_exact(1)?;
    slot.push(value);
    Ok(slot)
}

impl Receiver {
    pub const NAME: &'static str = "TaskReceive";

    pub fn new(ctx: TaskContext, queue: QueueReceiver<i32>, timing: ReceiverTiming) -> Self {
        Self { ctx, queue, timing }
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_task(Self::NAME)
    }

    /// Advances the state machine by one state.
    pub async fn step(&self, state: ReceiverState) -> ReceiverState {
        match state {
            ReceiverState::Waiting => self.wait().await,
            ReceiverState::Recovering => self.recover().await,
            ReceiverState::Terminated => ReceiverState::Terminated,
        }
    }

    async fn wait(&self) -> ReceiverState {
        match self.queue.recv_timeout(self.timing.reception_timeout).await {
            Ok(value) => {
                self.accept(value, copy_to_heap(value));
                ReceiverState::Waiting
            }
            Err(_) => {
                self.ctx.publish(
                    self.event(EventKind::ReceptionTimeout)
                        .with_timeout(self.timing.reception_timeout),
                );
                self.ctx.publish(self.event(EventKind::RecoveryAttempt));
                time::sleep(self.timing.recovery_pause).await;
                ReceiverState::Recovering
            }
        }
    }

    async fn recover(&self) -> ReceiverState {
        match self.queue.recv_timeout(self.timing.recovery_timeout).await {
            Ok(value) => {
                self.ctx
                    .publish(self.event(EventKind::RecoverySucceeded).with_value(value));
                self.ctx.flags.set_reception(true);
                ReceiverState::Waiting
            }
            Err(_) => {
                self.ctx.flags.set_reception(false);
                ReceiverState::Terminated
            }
        }
    }

    fn accept(&self, value: i32, copy: Result<Vec<i32>, TryReserveError>) {
        match copy {
            Ok(slot) => {
                for v in slot {
                    self.ctx
                        .publish(self.event(EventKind::ValueReceived).with_value(v));
                }
                self.ctx.flags.set_reception(true);
            }
            Err(e) => {
                self.ctx.publish(
                    self.event(EventKind::AllocationFailed)
                        .with_value(value)
                        .with_reason(e.to_string()),
                );
            }
        }
    }
}

#[async_trait]
impl Task for Receiver {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let wdt = self.ctx.watchdog.register(Self::NAME).await?;
        let mut state = ReceiverState::Waiting;

        loop {
            state = tokio::select! {
                _ = ctx.cancelled() => {
                    let _ = wdt.deregister().await;
                    return Err(TaskError::Canceled);
                }
                next = self.step(state) => next,
            };

            match state {
                ReceiverState::Waiting => wdt.reset(),
                ReceiverState::Recovering => {}
                ReceiverState::Terminated => {
                    wdt.deregister().await?;
                    self.ctx.publish(self.event(EventKind::ReceiverFailed));
                    return Err(TaskError::Fatal {
                        error: "persistent reception failure".into(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{self, QueueSender};
    use crate::tasks::tests_support::{context, drain};
    use tokio::time::Instant;

    fn receiver() -> (
        Receiver,
        QueueSender<i32>,
        TaskContext,
        tokio::sync::broadcast::Receiver<Event>,
    ) {
        let (ctx, events) = context();
        let (tx, rx) = queue::bounded::<i32>(10).expect("queue");
        let timing = ReceiverTiming::from(&Config::default());
        (Receiver::new(ctx.clone(), rx, timing), tx, ctx, events)
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiting_receives_value() {
        let (rx, tx, ctx, mut events) = receiver();
        tx.try_send(0);

        assert_eq!(rx.step(ReceiverState::Waiting).await, ReceiverState::Waiting);
        assert!(ctx.flags.peek().reception_ok);

        let ev = events.recv().await.expect("event");
        assert_eq!(ev.message(), "[RECEPTOR] Valor 0 recebido da fila.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_moves_to_recovering_after_pause() {
        let (rx, _tx, _ctx, mut events) = receiver();
        let start = Instant::now();

        assert_eq!(rx.step(ReceiverState::Waiting).await, ReceiverState::Recovering);
        assert_eq!(start.elapsed(), Duration::from_millis(4000));

        let kinds: Vec<EventKind> = drain(&mut events).iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::ReceptionTimeout, EventKind::RecoveryAttempt]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_success_returns_to_waiting() {
        let (rx, tx, ctx, mut events) = receiver();
        tx.try_send(42);

        assert_eq!(rx.step(ReceiverState::Recovering).await, ReceiverState::Waiting);
        assert!(ctx.flags.peek().reception_ok);
        let ev = events.recv().await.expect("event");
        assert_eq!(ev.message(), "[RECEPTOR] Recuperação bem-sucedida! Valor: 42");
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_failure_terminates_and_clears_flag() {
        let (rx, _tx, ctx, mut events) = receiver();
        ctx.flags.set_reception(true);
        let start = Instant::now();

        assert_eq!(
            rx.step(ReceiverState::Recovering).await,
            ReceiverState::Terminated
        );
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
        assert!(!ctx.flags.peek().reception_ok);
        // The failure line is published by `run`, once the watchdog entry is gone.
        assert!(drain(&mut events).is_empty());
        assert_eq!(
            rx.step(ReceiverState::Terminated).await,
            ReceiverState::Terminated
        );
    }

    #[tokio::test]
    async fn test_allocation_failure_leaves_flag_untouched() {
        let (rx, _tx, ctx, mut events) = receiver();
        let failure = Vec::<i32>::new()
            .try_reserve_exact(usize::MAX)
            .unwrap_err();

        rx.accept(9, Err(failure));
        assert!(!ctx.flags.peek().reception_ok);

        ctx.flags.set_reception(true);
        let failure = Vec::<i32>::new()
            .try_reserve_exact(usize::MAX)
            .unwrap_err();
        rx.accept(10, Err(failure));
        assert!(ctx.flags.peek().reception_ok);

        let ev = events.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::AllocationFailed);
        assert_eq!(ev.message(), "[RECEPTOR] ERRO: Falha ao alocar memória!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_terminates_after_two_silent_windows() {
        let (rx, _tx, ctx, mut events) = receiver();
        let start = Instant::now();

        let res = rx.run(CancellationToken::new()).await;
        assert!(matches!(res, Err(TaskError::Fatal { .. })));
        assert_eq!(start.elapsed(), Duration::from_millis(5000));
        assert!(!ctx.watchdog.is_registered(Receiver::NAME).await);

        let kinds: Vec<EventKind> = drain(&mut events).iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::WatchdogRegistered,
                EventKind::ReceptionTimeout,
                EventKind::RecoveryAttempt,
                EventKind::WatchdogDeregistered,
                EventKind::ReceiverFailed,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_resets_watchdog_after_recovery() {
        let (rx, tx, ctx, mut events) = receiver();
        let token = CancellationToken::new();
        let task = {
            let token = token.clone();
            tokio::spawn(async move { rx.run(token).await })
        };

        // Value arrives during the recovery pause (t = 3.5s), picked up at t = 4s.
        time::sleep(Duration::from_millis(3500)).await;
        tx.try_send(5);
        time::sleep(Duration::from_millis(600)).await;

        let since = ctx
            .watchdog
            .since_reset(Receiver::NAME)
            .await
            .expect("still registered");
        assert!(since < Duration::from_millis(1000), "since = {since:?}");

        token.cancel();
        assert!(matches!(task.await.expect("join"), Err(TaskError::Canceled)));
        assert!(drain(&mut events)
            .iter()
            .any(|e| e.kind == EventKind::RecoverySucceeded));
    }

    #[test]
    fn test_copy_to_heap() {
        assert_eq!(copy_to_heap(7).expect("alloc"), vec![7]);
    }
}
