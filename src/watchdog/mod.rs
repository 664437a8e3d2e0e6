//! # Task watchdog.
//!
//! A deadline monitor shared by every task. A task registers itself once and
//! must call [`WatchdogHandle::reset`] at least once per `watchdog_timeout`;
//! otherwise the monitor applies the configured [`ExpiryAction`](crate::ExpiryAction).
//!
//! ```text
//!  TaskGenerate ──register──► ┌──────────────────────────────┐
//!  TaskReceive  ──register──► │ Watchdog                     │
//!  TaskSupervision ─register► │  name → last reset (atomic)  │◄── monitor(): every check_interval
//!                             └──────────────────────────────┘        └─ elapsed > timeout?
//!        handle.reset()  ────────────── store(now) ─┘                       ├─ Panic    → panic!
//!        handle.deregister() ───────── remove entry                         └─ Shutdown → Err(WatchdogExpired)
//! ```
//!
//! ## Rules
//! - `reset()` is synchronous and lock-free; it may be called from any task.
//! - Registration names are unique.
//! - A task that ends on purpose deregisters first, so its silence is not a fault.
//! - Time is measured with `tokio::time::Instant`, so paused-clock tests drive it.

mod handle;
mod monitor;

pub use handle::WatchdogHandle;
pub use monitor::Watchdog;
