//! # Activity flags shared between the worker tasks and the supervision task.
//!
//! Two boolean cells, each with a single writer:
//! - `generation_ok` written by the generator after every send attempt;
//! - `reception_ok` written by the receiver on reception success or persistent failure.
//!
//! The supervision task reads **and clears** both cells once per cycle, so a
//! flag reflects "activity since the last report", not cumulative health.
//!
//! Cells are [`AtomicBool`]s; the read-and-clear is a single `swap(false)` per
//! flag, so a write that lands between the read and the clear cannot be lost.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct Cells {
    generation_ok: AtomicBool,
    reception_ok: AtomicBool,
}

/// Shared handle to the two activity flags. Cloning shares the same cells.
#[derive(Clone, Debug, Default)]
pub struct ActivityFlags {
    cells: Arc<Cells>,
}

/// Flag values observed by one supervision cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlagSnapshot {
    pub generation_ok: bool,
    pub reception_ok: bool,
}

impl ActivityFlags {
    /// Both flags start cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records generator activity (set after every attempt, sent or dropped).
    pub fn mark_generation(&self) {
        self.cells.generation_ok.store(true, Ordering::Release);
    }

    /// Records receiver outcome.
    pub fn set_reception(&self, ok: bool) {
        self.cells.reception_ok.store(ok, Ordering::Release);
    }

    /// Reads both flags without clearing them.
    pub fn peek(&self) -> FlagSnapshot {
        FlagSnapshot {
            generation_ok: self.cells.generation_ok.load(Ordering::Acquire),
            reception_ok: self.cells.reception_ok.load(Ordering::Acquire),
        }
    }

    /// Reads both flags and resets them to `false`.
    pub fn take(&self) -> FlagSnapshot {
        FlagSnapshot {
            generation_ok: self.cells.generation_ok.swap(false, Ordering::AcqRel),
            reception_ok: self.cells.reception_ok.swap(false, Ordering::AcqRel),
        }
    }
}

fn label(ok: bool) -> &'static str {
    if ok { "OK" } else { "FALHA" }
}

impl fmt::Display for FlagSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Geração=[{}] | Recepção=[{}]",
            label(self.generation_ok),
            label(self.reception_ok)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears_both_flags() {
        let flags = ActivityFlags::new();
        flags.mark_generation();
        flags.set_reception(true);

        let first = flags.take();
        assert!(first.generation_ok);
        assert!(first.reception_ok);

        let second = flags.take();
        assert_eq!(second, FlagSnapshot::default());
    }

    #[test]
    fn test_clones_share_cells() {
        let flags = ActivityFlags::new();
        let writer = flags.clone();
        writer.set_reception(true);
        assert!(flags.peek().reception_ok);
        assert!(!flags.peek().generation_ok);

        writer.set_reception(false);
        assert!(!flags.peek().reception_ok);
    }

    #[test]
    fn test_display() {
        let s = FlagSnapshot {
            generation_ok: false,
            reception_ok: true,
        };
        assert_eq!(s.to_string(), "Geração=[FALHA] | Recepção=[OK]");
    }
}
