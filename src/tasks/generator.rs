//! # Generator task (`TaskGenerate`).
//!
//! Produces sequential integers and offers each one to the queue without waiting.
//!
//! ```text
//! loop {
//!   ├─► value = counter; counter += 1 (wrapping)
//!   ├─► try_send(value)
//!   │     ├─ Sent    → ValueSent
//!   │     ├─ Dropped → ValueDropped (queue full, no retry)
//!   │     └─ Closed  → ValueRejected (no receiver left)
//!   ├─► generation_ok = true
//!   ├─► watchdog reset
//!   └─► sleep(generation_delay)   (cancellation point)
//! }
//! ```

use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::queue::{QueueSender, SendOutcome};
use crate::tasks::{Task, TaskContext};

/// Producer of sequential integers.
pub struct Generator {
    ctx: TaskContext,
    queue: QueueSender<i32>,
    delay: Duration,
    counter: AtomicI32,
}

impl Generator {
    pub const NAME: &'static str = "TaskGenerate";

    /// Creates a generator whose first value is 0.
    pub fn new(ctx: TaskContext, queue: QueueSender<i32>, delay: Duration) -> Self {
        Self {
            ctx,
            queue,
            delay,
            counter: AtomicI32::new(0),
        }
    }

    /// Overrides the first value produced.
    pub fn starting_at(self, first: i32) -> Self {
        self.counter.store(first, Ordering::Relaxed);
        self
    }

    /// Takes the next counter value; wraps at `i32::MAX`.
    fn next_value(&self) -> i32 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    /// One generation attempt: send or drop, publish the outcome, mark activity.
    pub fn produce(&self) -> SendOutcome<i32> {
        let value = self.next_value();
        let outcome = self.queue.try_send(value);

        let ev = match &outcome {
            SendOutcome::Sent => Event::new(EventKind::ValueSent),
            SendOutcome::Dropped { total_drops, .. } => {
                Event::new(EventKind::ValueDropped).with_drops(*total_drops)
            }
            SendOutcome::Closed(_) => Event::new(EventKind::ValueRejected),
        };
        self.ctx
            .publish(ev.with_task(Self::NAME).with_value(value));
        self.ctx.flags.mark_generation();
        outcome
    }
}

#[async_trait]
impl Task for Generator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let wdt = self.ctx.watchdog.register(Self::NAME).await?;

        loop {
            self.produce();
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
    async fn test_counter_increments_regardless_of_outcome() {
        let (ctx, _rx_bus) = context();
        let (tx, _rx) = crate::queue::bounded::<i32>(2).expect("queue");
        let generator = Generator::new(ctx.clone(), tx.clone(), Duration::from_millis(500));

        assert_eq!(generator.produce(), SendOutcome::Sent);
        assert_eq!(generator.produce(), SendOutcome::Sent);
        assert_eq!(
            generator.produce(),
            SendOutcome::Dropped {
                value: 2,
                total_drops: 1
            }
        );
        assert_eq!(
            generator.produce(),
            SendOutcome::Dropped {
                value: 3,
                total_drops: 2
            }
        );
        assert_eq!(tx.len(), 2);
        assert!(ctx.flags.peek().generation_ok);
    }

    #[tokio::test]
    async fn test_counter_wraps() {
        let (ctx, _rx_bus) = context();
        let (tx, rx) = crate::queue::bounded::<i32>(4).expect("queue");
        let generator =
            Generator::new(ctx, tx, Duration::from_millis(500)).starting_at(i32::MAX);

        generator.produce();
        generator.produce();
        assert_eq!(rx.recv_timeout(Duration::from_millis(1)).await, Ok(i32::MAX));
        assert_eq!(rx.recv_timeout(Duration::from_millis(1)).await, Ok(i32::MIN));
    }

    #[tokio::test]
    async fn test_drop_is_published_with_count() {
        let (ctx, mut events) = context();
        let (tx, _rx) = crate::queue::bounded::<i32>(1).expect("queue");
        let generator = Generator::new(ctx, tx, Duration::from_millis(500));

        generator.produce();
        generator.produce();

        let sent = events.recv().await.expect("sent");
        assert_eq!(sent.message(), "[GERADOR] Valor 0 enviado para a fila.");
        let dropped = events.recv().await.expect("dropped");
        assert_eq!(dropped.kind, EventKind::ValueDropped);
        assert_eq!(dropped.drops, Some(1));
        assert_eq!(dropped.message(), "[GERADOR] Fila cheia, valor 1 descartado.");
    }

    #[tokio::test]
    async fn test_closed_queue_is_not_reported_as_full() {
        let (ctx, mut events) = context();
        let (tx, rx) = crate::queue::bounded::<i32>(4).expect("queue");
        drop(rx);
        let generator = Generator::new(ctx.clone(), tx.clone(), Duration::from_millis(500));

        assert_eq!(generator.produce(), SendOutcome::Closed(0));
        assert_eq!(tx.drops(), 0);
        assert!(ctx.flags.peek().generation_ok);

        let ev = events.recv().await.expect("rejected");
        assert_eq!(ev.kind, EventKind::ValueRejected);
        assert_eq!(ev.message(), "[GERADOR] Fila fechada, valor 0 descartado.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_registers_and_stops_on_cancel() {
        let (ctx, _events) = context();
        let (tx, _rx) = crate::queue::bounded::<i32>(10).expect("queue");
        let generator = std::sync::Arc::new(Generator::new(
            ctx.clone(),
            tx.clone(),
            Duration::from_millis(500),
        ));
        let token = CancellationToken::new();

        let handle = {
            let generator = generator.clone();
            let token = token.clone();
            tokio::spawn(async move { generator.run(token).await })
        };

        time::sleep(Duration::from_millis(1250)).await;
        assert!(ctx.watchdog.is_registered(Generator::NAME).await);
        assert_eq!(tx.len(), 3);

        token.cancel();
        let res = handle.await.expect("join");
        assert!(matches!(res, Err(TaskError::Canceled)));
        assert!(!ctx.watchdog.is_registered(Generator::NAME).await);
    }
}
