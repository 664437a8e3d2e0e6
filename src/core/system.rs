//! # System: startup wiring, task actors, watchdog monitoring and shutdown.
//!
//! The [`System`] owns the event bus, a [`SubscriberSet`], the activity flags and
//! the lifecycle tracker. A run creates the watchdog and the queue, spawns one
//! actor per task and then waits for whichever comes first: a shutdown request,
//! a watchdog fault, or every task ending.
//!
//! ## High-level architecture
//! ```text
//! run_until(shutdown):
//!   listener: Bus.subscribe() ─► LifecycleTracker::update + SubscriberSet::emit
//!   publish SystemStarting
//!   Watchdog::init(cfg)                     ─► WatchdogInitialized
//!   queue::bounded(cfg.queue_capacity)
//!        └─ Err ─► QueueCreationFailed, return Err(QueueCreation)   (no task started)
//!   spawn actors (child tokens):
//!        TaskGenerate (prio 2) ── QueueSender ──┐
//!        TaskReceive  (prio 2) ◄─ QueueReceiver ┘
//!        TaskSupervision (prio 1)
//!   publish TasksStarted
//!
//!   select:
//!     shutdown future   ─► ShutdownRequested, cancel, wait_all_with_grace(cfg.grace)
//!     watchdog monitor  ─► (Shutdown action) cancel, wait, Err(WatchdogExpired)
//!                          (Panic action) panics inside monitor
//!     all actors ended  ─► Ok(())
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskwatch::{Config, LogWriter, Subscribe, System};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::from_config(&cfg))];
//!     let system = System::builder(cfg).with_subscribers(subs).build();
//!
//!     let res = system.run().await;
//!     system.shutdown().await;
//!     res?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::{
    actor::{ActorExit, TaskActor},
    builder::SystemBuilder,
    lifecycle::LifecycleTracker,
    shutdown,
};
use crate::{
    config::Config,
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    flags::ActivityFlags,
    queue::{self, QueueReceiver, QueueSender},
    subscribers::SubscriberSet,
    tasks::{Generator, Receiver, ReceiverTiming, Supervision, TaskContext, TaskSpec},
    watchdog::Watchdog,
};

/// Priority of the generator and receiver tasks.
const WORKER_PRIORITY: u8 = 2;
/// Priority of the supervision task.
const SUPERVISION_PRIORITY: u8 = 1;

/// Coordinates startup, task actors, the watchdog and graceful shutdown.
pub struct System {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    lifecycle: Arc<LifecycleTracker>,
    flags: ActivityFlags,
}

impl System {
    /// Creates a builder for the given configuration.
    pub fn builder(cfg: Config) -> SystemBuilder {
        SystemBuilder::new(cfg)
    }

    pub(super) fn new_internal(cfg: Config, bus: Bus, subs: Arc<SubscriberSet>) -> Self {
        Self {
            cfg,
            bus,
            subs,
            lifecycle: Arc::new(LifecycleTracker::new()),
            flags: ActivityFlags::new(),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus; subscribe **before** `run` to observe startup events.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Task lifecycle states.
    pub fn lifecycle(&self) -> &Arc<LifecycleTracker> {
        &self.lifecycle
    }

    /// Activity flags shared with the tasks.
    pub fn flags(&self) -> &ActivityFlags {
        &self.flags
    }

    /// Runs until SIGINT/SIGTERM (or Ctrl-C), a watchdog fault, or all tasks ending.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        self.run_until(shutdown::signal_or_pending()).await
    }

    /// Runs until `shutdown` completes, a watchdog fault, or all tasks ending.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let listener_token = CancellationToken::new();
        let listener = self.spawn_listener(listener_token.clone());

        let res = self.start_and_drive(shutdown).await;

        listener_token.cancel();
        let _ = listener.await;
        res
    }

    /// Flushes subscriber queues and stops their workers.
    pub async fn shutdown(self) {
        if let Ok(set) = Arc::try_unwrap(self.subs) {
            set.shutdown().await;
        }
    }

    /// Forwards bus events to the lifecycle tracker and the subscriber set.
    ///
    /// Pending events are drained before the cancellation is honoured.
    fn spawn_listener(&self, token: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        let lifecycle = Arc::clone(&self.lifecycle);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => {
                            lifecycle.update(&ev).await;
                            subs.emit(&ev);
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = token.cancelled() => break,
                }
            }
        })
    }

    async fn start_and_drive<F>(&self, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        self.bus.publish(Event::new(EventKind::SystemStarting));
        let watchdog = Watchdog::init(&self.cfg, self.bus.clone());

        let (tx, rx) = match queue::bounded::<i32>(self.cfg.queue_capacity) {
            Ok(halves) => halves,
            Err(source) => {
                self.bus.publish(
                    Event::new(EventKind::QueueCreationFailed).with_reason(source.to_string()),
                );
                return Err(RuntimeError::QueueCreation { source });
            }
        };

        let ctx = TaskContext {
            bus: self.bus.clone(),
            watchdog: Arc::clone(&watchdog),
            flags: self.flags.clone(),
            lifecycle: Arc::clone(&self.lifecycle),
        };
        // The system keeps its own receiver clone so the queue outlives a terminated receiver task.
        let specs = self.task_specs(ctx, tx, rx.clone());

        let token = CancellationToken::new();
        let mut set = JoinSet::new();
        for spec in &specs {
            let actor = TaskActor::new(spec, self.bus.clone());
            set.spawn(actor.run(token.child_token()));
        }
        self.bus.publish(Event::new(EventKind::TasksStarted));

        let res = self.drive(&mut set, &token, &watchdog, shutdown).await;
        drop(rx);
        res
    }

    fn task_specs(
        &self,
        ctx: TaskContext,
        tx: QueueSender<i32>,
        rx: QueueReceiver<i32>,
    ) -> Vec<TaskSpec> {
        let cfg = &self.cfg;
        vec![
            TaskSpec::new(
                Arc::new(Generator::new(ctx.clone(), tx, cfg.generation_delay)),
                WORKER_PRIORITY,
            ),
            TaskSpec::new(
                Arc::new(Receiver::new(ctx.clone(), rx, ReceiverTiming::from(cfg))),
                WORKER_PRIORITY,
            ),
            TaskSpec::new(
                Arc::new(Supervision::new(ctx, cfg.supervision_delay)),
                SUPERVISION_PRIORITY,
            ),
        ]
    }

    /// Waits for a shutdown request, a watchdog fault or all actors ending.
    async fn drive<F>(
        &self,
        set: &mut JoinSet<ActorExit>,
        token: &CancellationToken,
        watchdog: &Watchdog,
        shutdown: F,
    ) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let monitor = watchdog.monitor(token.child_token());
        tokio::pin!(monitor);
        tokio::pin!(shutdown);

        tokio::select! {
            _ = &mut shutdown => {
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                token.cancel();
                self.wait_all_with_grace(set).await
            }
            res = &mut monitor => {
                token.cancel();
                let _ = self.wait_all_with_grace(set).await;
                res
            }
            _ = async { while set.join_next().await.is_some() {} } => {
                token.cancel();
                Ok(())
            }
        }
    }

    /// Waits for all actors to finish within the configured grace period.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] on timeout and returns
    /// [`RuntimeError::GraceExceeded`] with the tasks still running.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<ActorExit>) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async { while set.join_next().await.is_some() {} };

        match time::timeout(grace, done).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.lifecycle.running().await;
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")));
                set.abort_all();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpiryAction;
    use crate::core::TaskState;
    use std::time::Duration;
    use tokio::sync::broadcast;

    fn collect(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn starving_cfg() -> Config {
        Config {
            watchdog_timeout: Duration::from_secs(10),
            generation_delay: Duration::from_secs(7),
            expiry_action: ExpiryAction::Shutdown,
            ..Config::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_values_flow_and_status_is_healthy() {
        let system = System::builder(Config::default()).build();
        let mut rx = system.bus().subscribe();

        let res = system
            .run_until(time::sleep(Duration::from_millis(2100)))
            .await;
        assert!(res.is_ok());

        let events = collect(&mut rx);
        let first_sent = events
            .iter()
            .find(|e| e.kind == EventKind::ValueSent)
            .expect("value sent");
        assert_eq!(first_sent.value, Some(0));
        let first_received = events
            .iter()
            .find(|e| e.kind == EventKind::ValueReceived)
            .expect("value received");
        assert_eq!(first_received.value, Some(0));

        let last_report = events
            .iter()
            .rev()
            .find(|e| e.kind == EventKind::StatusReport)
            .expect("status report");
        assert_eq!(
            last_report.message(),
            "[SUPERVISÃO] Status :: Geração=[OK] | Recepção=[OK] | Watchdog=[ATIVO]"
        );

        assert!(events.iter().any(|e| e.kind == EventKind::AllStoppedWithin));
        assert!(!events.iter().any(|e| e.kind == EventKind::WatchdogExpired));
        system.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_order() {
        let system = System::builder(Config::default()).build();
        let mut rx = system.bus().subscribe();

        system
            .run_until(time::sleep(Duration::from_millis(100)))
            .await
            .expect("run");

        let kinds: Vec<EventKind> = collect(&mut rx).into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds[0], EventKind::SystemStarting);
        assert_eq!(kinds[1], EventKind::WatchdogInitialized);
        let started = kinds
            .iter()
            .position(|k| *k == EventKind::TasksStarted)
            .expect("tasks started");
        let first_task = kinds
            .iter()
            .position(|k| *k == EventKind::TaskStarting)
            .expect("task starting");
        assert!(first_task > 1 && started > 1);
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::TaskStarting).count(),
            3
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_capacity_queue_aborts_startup() {
        let cfg = Config {
            queue_capacity: 0,
            ..Config::default()
        };
        let system = System::builder(cfg).build();
        let mut rx = system.bus().subscribe();

        let res = system.run_until(std::future::pending()).await;
        assert!(matches!(res, Err(RuntimeError::QueueCreation { .. })));

        let events = collect(&mut rx);
        let failed = events
            .iter()
            .find(|e| e.kind == EventKind::QueueCreationFailed)
            .expect("queue failure event");
        assert_eq!(failed.message(), "[ERRO] Falha ao criar a fila!");
        assert!(!events.iter().any(|e| e.kind == EventKind::TaskStarting));
        assert!(!events.iter().any(|e| e.kind == EventKind::TasksStarted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receiver_termination_keeps_system_running() {
        let system = System::builder(starving_cfg()).build();
        let mut rx = system.bus().subscribe();

        let res = system
            .run_until(time::sleep(Duration::from_millis(9000)))
            .await;
        assert!(res.is_ok());
        assert_eq!(
            system.lifecycle().state(Receiver::NAME).await,
            Some(TaskState::Terminated)
        );
        assert_eq!(
            system.lifecycle().state(Generator::NAME).await,
            Some(TaskState::Stopped)
        );

        let events = collect(&mut rx);
        assert!(events.iter().any(|e| e.kind == EventKind::ReceiverFailed));
        assert!(!events.iter().any(|e| e.kind == EventKind::WatchdogExpired));
        assert!(events.iter().any(|e| {
            e.kind == EventKind::WatchdogDeregistered && e.task.as_deref() == Some(Receiver::NAME)
        }));

        let report = events
            .iter()
            .rev()
            .find(|e| e.kind == EventKind::StatusReport)
            .expect("status report");
        assert!(report
            .message()
            .ends_with("| Watchdog=[ATIVO] | Encerradas=[TaskReceive]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_drops_values() {
        let cfg = Config {
            queue_capacity: 1,
            ..starving_cfg()
        };
        let system = System::builder(cfg).build();
        let mut rx = system.bus().subscribe();

        // Receiver takes 0 at t=0 and gives up at t=5s; 1 fills the queue at t=7s.
        let res = system
            .run_until(time::sleep(Duration::from_millis(15_000)))
            .await;
        assert!(res.is_ok());

        let events = collect(&mut rx);
        let dropped = events
            .iter()
            .find(|e| e.kind == EventKind::ValueDropped)
            .expect("dropped value");
        assert_eq!(dropped.value, Some(2));
        assert_eq!(dropped.drops, Some(1));
        assert_eq!(
            dropped.message(),
            "[GERADOR] Fila cheia, valor 2 descartado."
        );
        assert!(!events.iter().any(|e| e.kind == EventKind::WatchdogExpired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_task_trips_watchdog() {
        let cfg = Config {
            supervision_delay: Duration::from_secs(8),
            expiry_action: ExpiryAction::Shutdown,
            ..Config::default()
        };
        let system = System::builder(cfg).build();
        let mut rx = system.bus().subscribe();

        let res = system
            .run_until(time::sleep(Duration::from_secs(60)))
            .await;
        match res {
            Err(RuntimeError::WatchdogExpired { task, .. }) => {
                assert_eq!(task, Supervision::NAME)
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let events = collect(&mut rx);
        let expired = events
            .iter()
            .find(|e| e.kind == EventKind::WatchdogExpired)
            .expect("expiry event");
        assert_eq!(expired.task.as_deref(), Some(Supervision::NAME));
        assert!(!events.iter().any(|e| e.kind == EventKind::ShutdownRequested));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovered_receiver_keeps_watchdog_fed() {
        // Every wait times out at 3s and the next value shows up during the 1s pause,
        // so the receiver only ever returns to waiting through a recovery.
        let cfg = Config {
            generation_delay: Duration::from_millis(3500),
            expiry_action: ExpiryAction::Shutdown,
            ..Config::default()
        };
        let system = System::builder(cfg).build();
        let mut rx = system.bus().subscribe();

        let res = system
            .run_until(time::sleep(Duration::from_secs(40)))
            .await;
        assert!(res.is_ok(), "unexpected result: {res:?}");

        let events = collect(&mut rx);
        assert!(events.iter().any(|e| e.kind == EventKind::RecoverySucceeded));
        assert!(!events.iter().any(|e| e.kind == EventKind::WatchdogExpired));
        assert!(!events.iter().any(|e| e.kind == EventKind::ReceiverFailed));
    }
}
