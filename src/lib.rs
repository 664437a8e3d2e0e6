//! # taskwatch
//!
//! **Taskwatch** runs three cooperating tasks around one bounded queue and
//! guards them with a task watchdog:
//!
//! - `TaskGenerate` produces an increasing integer every 500 ms and drops it
//!   if the queue is full;
//! - `TaskReceive` consumes values with a timed wait, attempts one recovery
//!   after a timeout and terminates itself if the recovery also fails;
//! - `TaskSupervision` samples and clears the activity flags every 2 s and
//!   reports the health of the system.
//!
//! Each task resets its watchdog entry once per loop. If any registered task
//! stays silent for longer than the watchdog timeout, the system faults.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐  QueueSender   ┌──────────────┐   ┌─────────────────┐
//!     │ TaskGenerate │ ─────────────► │ TaskReceive  │   │ TaskSupervision │
//!     │   (prio 2)   │  bounded(10)   │   (prio 2)   │   │    (prio 1)     │
//!     └──┬───────┬───┘                └──┬───────┬───┘   └──┬──────────┬───┘
//!        │ reset │ mark_generation       │ reset │ set_reception │ reset │ take()
//!        ▼       ▼                       ▼       ▼          ▼          ▼
//! ┌───────────────────────────────┐   ┌───────────────────────────────────┐
//! │ Watchdog (timeout 6 s)        │   │ ActivityFlags                     │
//! │  monitor() polls every 250 ms │   │  generation_ok / reception_ok     │
//! └───────────────┬───────────────┘   └───────────────────────────────────┘
//!                 │ WatchdogExpired
//!                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Bus (broadcast of Event)                       │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │   system listener      │
//!                       └───┬────────────────┬───┘
//!                           ▼                ▼
//!                 LifecycleTracker     SubscriberSet ──► LogWriter (tracing)
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskwatch::{Config, LogWriter, Subscribe, System};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cfg = Config::default();
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::from_config(&cfg))];
//!
//!     let system = System::builder(cfg).with_subscribers(subs).build();
//!     let res = system.run().await;
//!     system.shutdown().await;
//!     Ok(res?)
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod flags;
mod queue;
mod subscribers;
mod tasks;
mod watchdog;

pub use config::{Config, ExpiryAction};
pub use crate::core::{ActorExit, LifecycleTracker, System, SystemBuilder, TaskActor, TaskState};
pub use error::{QueueError, RecvError, RuntimeError, TaskError, WatchdogError};
pub use events::{Bus, Event, EventKind};
pub use flags::{ActivityFlags, FlagSnapshot};
pub use queue::{bounded, QueueReceiver, QueueSender, SendOutcome};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{
    Generator, Receiver, ReceiverState, ReceiverTiming, Supervision, Task, TaskContext, TaskRef,
    TaskSpec,
};
pub use watchdog::{Watchdog, WatchdogHandle};
