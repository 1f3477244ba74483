#![forbid(unsafe_code)]

//! One-way hand-off from the animation context to the data context.
//!
//! The animation context owns the [`HandoffWriter`]; the data context owns
//! the [`HandoffReader`]. Each shared field has exactly one writer:
//!
//! | Field | Writer | Reader |
//! |-------|--------|--------|
//! | committed scroll (`mpsc`) | animation | data |
//! | taps (`mpsc`) | animation | data |
//! | `commit_pending` (atomic) | animation | data |
//!
//! Neither side ever blocks on the other.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use epg_core::geometry::{Point, Translation};

use crate::commit_throttle::CommittedScroll;

/// A tap together with the live translation it happened under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapEvent {
    /// Viewport coordinates of the tap.
    pub screen: Point,
    /// Live translation at tap time.
    pub translation: Translation,
}

/// Factory for writer/reader pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollHandoff;

impl ScrollHandoff {
    /// Create a connected writer/reader pair.
    #[must_use]
    pub fn channel() -> (HandoffWriter, HandoffReader) {
        let (scroll_tx, scroll_rx) = mpsc::channel();
        let (tap_tx, tap_rx) = mpsc::channel();
        let pending = Arc::new(AtomicBool::new(false));
        (
            HandoffWriter {
                scroll_tx,
                tap_tx,
                pending: Arc::clone(&pending),
            },
            HandoffReader {
                scroll_rx,
                tap_rx,
                pending,
                last_seq: 0,
            },
        )
    }
}

/// Animation-side end.
#[derive(Debug)]
pub struct HandoffWriter {
    scroll_tx: mpsc::Sender<CommittedScroll>,
    tap_tx: mpsc::Sender<TapEvent>,
    pending: Arc<AtomicBool>,
}

impl HandoffWriter {
    /// Publish a committed scroll. Returns `false` once the reader is gone.
    pub fn publish(&self, committed: CommittedScroll) -> bool {
        self.scroll_tx.send(committed).is_ok()
    }

    /// Forward a tap. Returns `false` once the reader is gone.
    pub fn tap(&self, tap: TapEvent) -> bool {
        self.tap_tx.send(tap).is_ok()
    }

    /// Mark whether a commit is scheduled but not yet published.
    pub fn set_commit_pending(&self, pending: bool) {
        self.pending.store(pending, Ordering::Release);
    }
}

/// Data-side end.
#[derive(Debug)]
pub struct HandoffReader {
    scroll_rx: mpsc::Receiver<CommittedScroll>,
    tap_rx: mpsc::Receiver<TapEvent>,
    pending: Arc<AtomicBool>,
    last_seq: u64,
}

impl HandoffReader {
    /// Drain the scroll channel and return the newest value not seen yet.
    pub fn latest(&mut self) -> Option<CommittedScroll> {
        let mut newest: Option<CommittedScroll> = None;
        while let Ok(c) = self.scroll_rx.try_recv() {
            if c.seq > self.last_seq && newest.is_none_or(|n| c.seq > n.seq) {
                newest = Some(c);
            }
        }
        if let Some(c) = newest {
            self.last_seq = c.seq;
        }
        newest
    }

    /// Drain pending taps in arrival order.
    pub fn taps(&mut self) -> Vec<TapEvent> {
        self.tap_rx.try_iter().collect()
    }

    /// Whether the animation context has a commit scheduled.
    #[must_use]
    pub fn commit_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Highest sequence number consumed.
    #[inline]
    #[must_use]
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }
}
