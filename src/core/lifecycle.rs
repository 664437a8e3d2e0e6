//! # Task lifecycle tracker with sequence-based ordering.
//!
//! Maintains authoritative state of every task the system started, using event
//! sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! TaskActor ──► Bus ──► system listener ──► LifecycleTracker::update()
//!                                                   │
//!                                                   ▼
//!                                      HashMap<String, Entry>
//!                                      (name → {seq, state})
//! ```
//!
//! ## Rules
//! - `TaskStarting` → `Running`; `TaskStopped` → `Stopped`; `TaskTerminated` → `Terminated`
//! - Other events are ignored
//! - Events with `seq <= last_seq` are **rejected** (stale)
//! - Reads are **eventually consistent** with the bus

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

/// Lifecycle state of one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Running its loop.
    Running,
    /// Stopped by shutdown.
    Stopped,
    /// Ended itself after a fatal condition.
    Terminated,
}

#[derive(Debug, Clone)]
struct Entry {
    last_seq: u64,
    state: TaskState,
}

/// Thread-safe tracker of task lifecycle states.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    state: RwLock<HashMap<String, Entry>>,
}

impl LifecycleTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a lifecycle event if it is newer than the last one seen for its task.
    ///
    /// Returns `true` if the state changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let next = match ev.kind {
            EventKind::TaskStarting => TaskState::Running,
            EventKind::TaskStopped => TaskState::Stopped,
            EventKind::TaskTerminated => TaskState::Terminated,
            _ => return false,
        };
        let Some(name) = ev.task.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(Entry {
            last_seq: 0,
            state: next,
        });
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        entry.state = next;
        true
    }

    /// Current state of `name`, if it was ever started.
    pub async fn state(&self, name: &str) -> Option<TaskState> {
        self.state.read().await.get(name).map(|e| e.state)
    }

    /// Sorted names of tasks in `Running`.
    pub async fn running(&self) -> Vec<String> {
        self.names_in(TaskState::Running).await
    }

    /// Sorted names of tasks in `Terminated`.
    pub async fn terminated(&self) -> Vec<String> {
        self.names_in(TaskState::Terminated).await
    }

    async fn names_in(&self, wanted: TaskState) -> Vec<String> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state
            .iter()
            .filter(|(_, e)| e.state == wanted)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }
}
