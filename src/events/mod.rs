//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to everything the system does: startup, watchdog
//! activity, task lifecycle and the values moving through the queue.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification, payload and rendering
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `System`, `Watchdog`, `TaskActor`, the three tasks,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the system listener (fans out to `SubscriberSet` and
//!   updates `LifecycleTracker`), plus any receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
