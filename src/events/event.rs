//! # Runtime events emitted by the system, the watchdog and the tasks.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **System events**: startup, queue creation, shutdown
//! - **Watchdog events**: initialization, registration, expiry
//! - **Task lifecycle events**: starting, stopped, terminated
//! - **Data-path events**: values sent/dropped/received, recovery, status reports
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! the integer value involved, drop counters and flag snapshots.
//!
//! ## Rendering
//! [`Event::message`] produces the human-readable log line for an event and
//! [`Event::level`] the level it is logged at. The tasks never log directly;
//! the [`LogWriter`](crate::LogWriter) subscriber renders what they publish.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskwatch::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ValueSent)
//!     .with_task("TaskGenerate")
//!     .with_value(0);
//!
//! assert_eq!(ev.kind, EventKind::ValueSent);
//! assert_eq!(ev.message(), "[GERADOR] Valor 0 enviado para a fila.");
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use tracing::Level;

use crate::flags::FlagSnapshot;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === System events ===
    /// Startup routine entered.
    SystemStarting,

    /// The data queue could not be created; no task will be started.
    ///
    /// Sets:
    /// - `reason`: creation error
    QueueCreationFailed,

    /// All tasks were spawned.
    TasksStarted,

    /// Shutdown requested (OS signal or caller-provided future).
    ShutdownRequested,

    /// All tasks stopped within configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not stop in time.
    GraceExceeded,

    // === Watchdog events ===
    /// Watchdog configured.
    ///
    /// Sets:
    /// - `timeout_ms`: liveness deadline
    WatchdogInitialized,

    /// A task registered itself with the watchdog.
    ///
    /// Sets:
    /// - `task`: task name
    WatchdogRegistered,

    /// A task removed its registration (clean exit).
    ///
    /// Sets:
    /// - `task`: task name
    WatchdogDeregistered,

    /// A registered task missed its liveness deadline.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `elapsed_ms`: time since the last reset
    /// - `timeout_ms`: configured deadline
    WatchdogExpired,

    // === Task lifecycle events ===
    /// Task is starting.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `priority`: nominal priority from the `TaskSpec`
    TaskStarting,

    /// Task has stopped (returned normally **or** was cancelled).
    ///
    /// Sets:
    /// - `task`: task name
    TaskStopped,

    /// Task ended itself permanently after a fatal condition.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `reason`: fatal error message
    TaskTerminated,

    // === Generator events ===
    /// A value was enqueued.
    ///
    /// Sets:
    /// - `task`, `value`
    ValueSent,

    /// The queue was full and the value was discarded.
    ///
    /// Sets:
    /// - `task`, `value`
    /// - `drops`: total drops so far, this one included
    ValueDropped,

    /// The queue has no receiver left and the value was discarded.
    ///
    /// Sets:
    /// - `task`, `value`
    ValueRejected,

    // === Receiver events ===
    /// A value was received and copied.
    ///
    /// Sets:
    /// - `task`, `value`
    ValueReceived,

    /// A value was received but the transient copy could not be allocated.
    ///
    /// Sets:
    /// - `task`, `value`
    AllocationFailed,

    /// Nothing arrived within the reception timeout.
    ///
    /// Sets:
    /// - `task`, `timeout_ms`
    ReceptionTimeout,

    /// Receiver is about to attempt one bounded recovery wait.
    RecoveryAttempt,

    /// Recovery wait produced a value.
    ///
    /// Sets:
    /// - `task`, `value`
    RecoverySucceeded,

    /// Recovery wait timed out; the receiver gives up.
    ReceiverFailed,

    // === Supervision events ===
    /// Periodic health report.
    ///
    /// Sets:
    /// - `task`: reporting task
    /// - `status`: flags observed since the last report
    /// - `terminated`: tasks known to have ended themselves
    StatusReport,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number (starts at 1).
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Integer value carried through the queue.
    pub value: Option<i32>,
    /// Running count of discarded values.
    pub drops: Option<u64>,
    /// Flags observed by the supervision task.
    pub status: Option<FlagSnapshot>,
    /// Tasks that terminated themselves (status reports only).
    pub terminated: Option<Arc<[String]>>,
    /// Configured timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Elapsed time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Nominal task priority.
    pub priority: Option<u8>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

#[inline]
fn millis(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed) + 1,
            at: SystemTime::now(),
            kind,
            task: None,
            value: None,
            drops: None,
            status: None,
            terminated: None,
            timeout_ms: None,
            elapsed_ms: None,
            priority: None,
            reason: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the integer value involved.
    #[inline]
    pub fn with_value(mut self, value: i32) -> Self {
        self.value = Some(value);
        self
    }

    /// Attaches the running drop count.
    #[inline]
    pub fn with_drops(mut self, drops: u64) -> Self {
        self.drops = Some(drops);
        self
    }

    /// Attaches a flag snapshot.
    #[inline]
    pub fn with_status(mut self, status: FlagSnapshot) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches the names of self-terminated tasks.
    #[inline]
    pub fn with_terminated(mut self, names: Vec<String>) -> Self {
        self.terminated = Some(names.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(millis(d));
        self
    }

    /// Attaches a nominal priority.
    #[inline]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// Level this event is logged at.
    pub fn level(&self) -> Level {
        match self.kind {
            EventKind::SystemStarting
            | EventKind::TasksStarted
            | EventKind::WatchdogInitialized
            | EventKind::ValueSent
            | EventKind::ValueReceived
            | EventKind::RecoveryAttempt
            | EventKind::RecoverySucceeded
            | EventKind::StatusReport
            | EventKind::ShutdownRequested
            | EventKind::AllStoppedWithin => Level::INFO,

            EventKind::ValueDropped
            | EventKind::ValueRejected
            | EventKind::ReceptionTimeout
            | EventKind::SubscriberOverflow
            | EventKind::GraceExceeded => Level::WARN,

            EventKind::QueueCreationFailed
            | EventKind::AllocationFailed
            | EventKind::ReceiverFailed
            | EventKind::WatchdogExpired
            | EventKind::SubscriberPanicked => Level::ERROR,

            EventKind::WatchdogRegistered
            | EventKind::WatchdogDeregistered
            | EventKind::TaskStarting
            | EventKind::TaskStopped
            | EventKind::TaskTerminated => Level::DEBUG,
        }
    }

    /// Renders the log line for this event (without banner or tag).
    pub fn message(&self) -> String {
        let task = self.task.as_deref().unwrap_or("?");
        let value = self.value.unwrap_or_default();
        let reason = self.reason.as_deref().unwrap_or("unknown");

        match self.kind {
            EventKind::SystemStarting => "[SISTEMA] Inicializando sistema multitarefa...".into(),
            EventKind::QueueCreationFailed => "[ERRO] Falha ao criar a fila!".into(),
            EventKind::TasksStarted => "[SISTEMA] Tarefas iniciadas com sucesso!".into(),
            EventKind::ShutdownRequested => "[SISTEMA] Encerramento solicitado.".into(),
            EventKind::AllStoppedWithin => "[SISTEMA] Todas as tarefas encerradas.".into(),
            EventKind::GraceExceeded => format!(
                "[SISTEMA] Tempo de encerramento excedido; pendentes: {reason}"
            ),

            EventKind::WatchdogInitialized => format!(
                "[WDT] Watchdog inicializado com timeout de {} segundos.",
                self.timeout_ms.unwrap_or_default() / 1000
            ),
            EventKind::WatchdogRegistered => format!("[WDT] Tarefa {task} registrada."),
            EventKind::WatchdogDeregistered => format!("[WDT] Tarefa {task} removida."),
            EventKind::WatchdogExpired => format!(
                "[WDT] Tarefa {task} sem sinal de vida há {} ms (limite {} ms).",
                self.elapsed_ms.unwrap_or_default(),
                self.timeout_ms.unwrap_or_default()
            ),

            EventKind::TaskStarting => format!(
                "[SISTEMA] Tarefa {task} iniciada (prioridade {}).",
                self.priority.unwrap_or_default()
            ),
            EventKind::TaskStopped => format!("[SISTEMA] Tarefa {task} parada."),
            EventKind::TaskTerminated => format!("[SISTEMA] Tarefa {task} encerrada: {reason}"),

            EventKind::ValueSent => format!("[GERADOR] Valor {value} enviado para a fila."),
            EventKind::ValueDropped => format!("[GERADOR] Fila cheia, valor {value} descartado."),
            EventKind::ValueRejected => format!("[GERADOR] Fila fechada, valor {value} descartado."),

            EventKind::ValueReceived => format!("[RECEPTOR] Valor {value} recebido da fila."),
            EventKind::AllocationFailed => "[RECEPTOR] ERRO: Falha ao alocar memória!".into(),
            EventKind::ReceptionTimeout => {
                "[RECEPTOR] AVISO: Nenhum dado recebido no tempo limite.".into()
            }
            EventKind::RecoveryAttempt => "[RECEPTOR] Tentando recuperar...".into(),
            EventKind::RecoverySucceeded => {
                format!("[RECEPTOR] Recuperação bem-sucedida! Valor: {value}")
            }
            EventKind::ReceiverFailed => {
                "[RECEPTOR] ERRO FATAL: Falha persistente. Encerrando tarefa...".into()
            }

            EventKind::StatusReport => {
                let status = self.status.unwrap_or_default();
                let mut line = format!("[SUPERVISÃO] Status :: {status} | Watchdog=[ATIVO]");
                if let Some(names) = self.terminated.as_deref().filter(|n| !n.is_empty()) {
                    line.push_str(&format!(" | Encerradas=[{}]", names.join(", ")));
                }
                line
            }

            EventKind::SubscriberOverflow => {
                format!("[SISTEMA] Assinante {task} descartou evento ({reason}).")
            }
            EventKind::SubscriberPanicked => {
                format!("[SISTEMA] Assinante {task} entrou em pânico: {reason}")
            }
        }
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
