//! Error types used by the taskwatch runtime, the watchdog, the queue and tasks.
//!
//! - [`RuntimeError`]: errors raised by the system itself (startup, watchdog fault, shutdown).
//! - [`TaskError`]: errors returned by individual task executions.
//! - [`WatchdogError`]: registration errors.
//! - [`QueueError`] / [`RecvError`]: queue creation and reception errors.
//!
//! Every enum provides `as_label` (a short stable snake_case label for logs).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the taskwatch runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The data queue could not be created; no task was started.
    #[error("queue creation failed: {source}")]
    QueueCreation {
        #[source]
        source: QueueError,
    },

    /// A registered task did not reset its liveness signal within the deadline.
    #[error("watchdog expired: task {task} silent for {elapsed:?} (timeout {timeout:?})")]
    WatchdogExpired {
        /// Name of the silent task.
        task: String,
        /// Time since its last reset.
        elapsed: Duration,
        /// Configured deadline.
        timeout: Duration,
    },

    /// Shutdown grace period was exceeded; some tasks remained stuck.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// List of task names that did not shut down in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use taskwatch::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::QueueCreation { .. } => "runtime_queue_creation",
            RuntimeError::WatchdogExpired { .. } => "runtime_watchdog_expired",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by task execution.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task gave up permanently; it will not run again.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled due to runtime shutdown.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Canceled => "task_canceled",
        }
    }
}

/// # Errors produced by watchdog registration.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WatchdogError {
    /// A task with this name is already registered.
    #[error("task {0} already registered")]
    AlreadyRegistered(String),

    /// No registration exists for this name.
    #[error("task {0} not registered")]
    NotRegistered(String),
}

impl WatchdogError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WatchdogError::AlreadyRegistered(_) => "watchdog_already_registered",
            WatchdogError::NotRegistered(_) => "watchdog_not_registered",
        }
    }
}

impl From<WatchdogError> for TaskError {
    fn from(e: WatchdogError) -> Self {
        TaskError::Fatal {
            error: e.to_string(),
        }
    }
}

/// # Errors produced when creating a queue.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// A queue must hold at least one item.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,
}

/// # Errors produced by a timed receive.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecvError {
    /// Nothing arrived within the timeout.
    #[error("no item within {0:?}")]
    Timeout(Duration),

    /// Every sender is gone and the queue is drained.
    #[error("queue closed")]
    Closed,
}

impl RecvError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RecvError::Timeout(_) => "recv_timeout",
            RecvError::Closed => "recv_closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let err = RuntimeError::QueueCreation {
            source: QueueError::ZeroCapacity,
        };
        assert_eq!(err.as_label(), "runtime_queue_creation");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
        assert_eq!(
            RecvError::Timeout(Duration::from_secs(3)).as_label(),
            "recv_timeout"
        );
    }

    #[test]
    fn test_watchdog_error_becomes_fatal() {
        let err: TaskError = WatchdogError::AlreadyRegistered("TaskGenerate".into()).into();
        assert!(matches!(err, TaskError::Fatal { .. }));
        assert_eq!(err.to_string(), "fatal error: task TaskGenerate already registered");
    }
}
