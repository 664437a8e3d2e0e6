//! # Bounded FIFO queue between the generator and the receiver.
//!
//! Thin wrapper over [`tokio::sync::mpsc`] with the two operations the tasks need:
//! - [`QueueSender::try_send`] never blocks; a full queue discards the item and
//!   bumps a drop counter, reported back as [`SendOutcome::Dropped`];
//! - [`QueueReceiver::recv_timeout`] blocks up to a deadline.
//!
//! ```text
//!  TaskGenerate ── try_send ──► [ slot | slot | ... | slot ] ── recv_timeout ──► TaskReceive
//!                                  capacity N, FIFO
//! ```
//!
//! ## Rules
//! - Occupancy never exceeds capacity; a send on a full queue drops, never waits.
//! - Insertion order is preserved.
//! - Both halves are cheap to clone; the channel stays open while any receiver clone
//!   is alive, so the system keeps one for the whole run.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use crate::error::{QueueError, RecvError};

/// Result of a non-blocking send.
#[derive(Debug, PartialEq, Eq)]
pub enum SendOutcome<T> {
    /// The item was enqueued.
    Sent,
    /// The queue was full; the item was discarded.
    Dropped {
        /// The discarded item.
        value: T,
        /// Drops so far on this queue, this one included.
        total_drops: u64,
    },
    /// The receiving side is gone; the item was discarded.
    Closed(T),
}

/// Producer half.
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: mpsc::Sender<T>,
    drops: Arc<AtomicU64>,
}

/// Consumer half.
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            drops: Arc::clone(&self.drops),
        }
    }
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

/// Creates a bounded queue holding at most `capacity` items.
///
/// Fails with [`QueueError::ZeroCapacity`] when `capacity == 0`.
///
/// ```rust
/// use taskwatch::{bounded, QueueError, SendOutcome};
///
/// let (tx, _rx) = bounded::<i32>(1)?;
/// assert_eq!(tx.try_send(1), SendOutcome::Sent);
/// assert!(matches!(tx.try_send(2), SendOutcome::Dropped { total_drops: 1, .. }));
/// assert_eq!(bounded::<i32>(0).err(), Some(QueueError::ZeroCapacity));
/// # Ok::<(), QueueError>(())
/// ```
pub fn bounded<T>(capacity: usize) -> Result<(QueueSender<T>, QueueReceiver<T>), QueueError> {
    if capacity == 0 {
        return Err(QueueError::ZeroCapacity);
    }
    let (tx, rx) = mpsc::channel(capacity);
    Ok((
        QueueSender {
            tx,
            drops: Arc::new(AtomicU64::new(0)),
        },
        QueueReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    ))
}

impl<T> QueueSender<T> {
    /// Attempts to enqueue without waiting.
    pub fn try_send(&self, value: T) -> SendOutcome<T> {
        match self.tx.try_send(value) {
            Ok(()) => SendOutcome::Sent,
            Err(mpsc::error::TrySendError::Full(value)) => SendOutcome::Dropped {
                value,
                total_drops: self.drops.fetch_add(1, Ordering::Relaxed) + 1,
            },
            Err(mpsc::error::TrySendError::Closed(value)) => SendOutcome::Closed(value),
        }
    }

    /// Items currently waiting in the queue.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// True when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of items the queue holds.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Total items discarded because the queue was full.
    pub fn drops(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }
}

impl<T> QueueReceiver<T> {
    /// Waits up to `timeout` for the next item.
    ///
    /// A zero timeout only returns an item that is already queued.
    pub async fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvError> {
        let mut rx = self.rx.lock().await;
        if timeout.is_zero() {
            return match rx.try_recv() {
                Ok(v) => Ok(v),
                Err(mpsc::error::TryRecvError::Empty) => Err(RecvError::Timeout(timeout)),
                Err(mpsc::error::TryRecvError::Disconnected) => Err(RecvError::Closed),
            };
        }
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err(RecvError::Closed),
            Err(_elapsed) => Err(RecvError::Timeout(timeout)),
        }
    }
}
