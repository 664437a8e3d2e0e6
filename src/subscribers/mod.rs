//! # Event subscribers.
//!
//! The [`Subscribe`] trait and the [`SubscriberSet`] that fans bus events out
//! to them, plus the built-in [`LogWriter`].
//!
//! ```text
//! Task ── publish(Event) ──► Bus ──► system listener ──► SubscriberSet::emit
//!                                                            │
//!                                                   ┌────────┴────────┐
//!                                                   ▼                 ▼
//!                                               LogWriter          custom ...
//! ```

mod log;
mod subscribe;
mod subscriber_set;

pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
