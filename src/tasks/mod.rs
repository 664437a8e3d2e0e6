//! # Task abstractions and the three system tasks.
//!
//! - [`Task`] - trait for async cancelable tasks
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskSpec`] - task plus its nominal priority
//! - [`TaskContext`] - shared state handed to every task at construction
//! - [`Generator`], [`Receiver`], [`Supervision`] - the producer, consumer and reporter

mod context;
mod generator;
mod receiver;
mod spec;
mod supervision;
mod task;

pub use context::TaskContext;
pub use generator::Generator;
pub use receiver::{Receiver, ReceiverState, ReceiverTiming};
pub use spec::TaskSpec;
pub use supervision::Supervision;
pub use task::{Task, TaskRef};
