//! Runtime core: wiring and lifecycle.
//!
//! The public entry point is [`System`], built through [`SystemBuilder`].
//!
//! Internal modules:
//! - [`system`]: starts the watchdog, the queue and the three tasks, then waits for shutdown;
//! - [`actor`]: runs a single task and publishes how it ended;
//! - [`lifecycle`]: per-task state derived from bus events;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod actor;
mod builder;
mod lifecycle;
mod shutdown;
mod system;

pub use actor::{ActorExit, TaskActor};
pub use builder::SystemBuilder;
pub use lifecycle::{LifecycleTracker, TaskState};
pub use system::System;
