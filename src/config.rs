//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the system: watchdog deadline,
//! queue capacity, task periods and timeouts, shutdown grace and log decoration.
//!
//! Every value is fixed at build time; the defaults are the values the system
//! is meant to run with. Fields are public so tests can shrink or stretch them.
//!
//! ## Sentinel values
//! - `watchdog_check_interval = 0s` → clamped to 1ms by [`Config::check_interval`]
//! - `bus_capacity = 0` → clamped to 1 by [`Config::bus_capacity_clamped`]

use std::time::Duration;

/// What the watchdog does when a registered task misses its deadline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExpiryAction {
    /// Unrecoverable fault: the monitor panics.
    #[default]
    Panic,
    /// The system cancels every task and `run` returns
    /// [`RuntimeError::WatchdogExpired`](crate::RuntimeError::WatchdogExpired).
    Shutdown,
}

/// Global configuration for the system.
///
/// ## Field semantics
/// - `watchdog_timeout`: deadline between two liveness resets of a registered task
/// - `watchdog_check_interval`: how often the monitor scans registrations
/// - `expiry_action`: fault policy on a missed deadline
/// - `queue_capacity`: slots in the data queue (`0` makes queue creation fail)
/// - `generation_delay`: generator period
/// - `reception_timeout`: receiver wait in the `Waiting` state
/// - `recovery_pause`: receiver sleep between the timeout and the recovery wait
/// - `recovery_timeout`: receiver wait in the `Recovering` state
/// - `supervision_delay`: supervision period
/// - `grace`: maximum wait for tasks to stop after shutdown is requested
/// - `bus_capacity`: event bus ring buffer size
/// - `tag` / `banner`: decoration added to every log line
#[derive(Clone, Debug)]
pub struct Config {
    pub watchdog_timeout: Duration,
    pub watchdog_check_interval: Duration,
    pub expiry_action: ExpiryAction,

    pub queue_capacity: usize,

    pub generation_delay: Duration,
    pub reception_timeout: Duration,
    pub recovery_pause: Duration,
    pub recovery_timeout: Duration,
    pub supervision_delay: Duration,

    /// Maximum time to wait for graceful shutdown.
    ///
    /// When shutdown is requested:
    /// - Tasks are cancelled via `CancellationToken`
    /// - System waits up to `grace` for tasks to exit
    /// - If exceeded, returns `RuntimeError::GraceExceeded`
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    pub tag: &'static str,
    pub banner: &'static str,
}

impl Config {
    /// Returns the monitor scan interval, never zero.
    #[inline]
    pub fn check_interval(&self) -> Duration {
        self.watchdog_check_interval.max(Duration::from_millis(1))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Longest stretch a receiver loop body can take without a liveness reset:
    /// reception timeout, recovery pause and recovery timeout chained.
    #[inline]
    pub fn worst_receiver_cycle(&self) -> Duration {
        self.reception_timeout + self.recovery_pause + self.recovery_timeout
    }

    /// True when every task period fits inside the watchdog deadline.
    pub fn fits_watchdog(&self) -> bool {
        [
            self.generation_delay,
            self.worst_receiver_cycle(),
            self.supervision_delay,
        ]
        .iter()
        .all(|d| *d < self.watchdog_timeout)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `watchdog_timeout = 6s`, checked every `250ms`, panic on expiry
    /// - `queue_capacity = 10`
    /// - `generation_delay = 500ms`
    /// - `reception_timeout = 3000ms`, `recovery_pause = 1000ms`, `recovery_timeout = 1000ms`
    /// - `supervision_delay = 2000ms`
    /// - `grace = 5s`, `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            watchdog_timeout: Duration::from_secs(6),
            watchdog_check_interval: Duration::from_millis(250),
            expiry_action: ExpiryAction::Panic,
            queue_capacity: 10,
            generation_delay: Duration::from_millis(500),
            reception_timeout: Duration::from_millis(3000),
            recovery_pause: Duration::from_millis(1000),
            recovery_timeout: Duration::from_millis(1000),
            supervision_delay: Duration::from_millis(2000),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            tag: "PROVA_FINAL",
            banner: "{Hugo Leonardo-RM:89360}",
        }
    }
}
