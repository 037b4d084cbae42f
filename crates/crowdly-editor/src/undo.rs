//! Single-slot undo buffer with a countdown.
//!
//! ```text
//!            arm(snapshot, label)
//!   Empty ─────────────────────────▶ Armed(snapshot, label, ticket)
//!     ▲                                 │        │
//!     │      fire() → snapshot          │        │ arm() again: old entry
//!     ├─────────────────────────────────┘        │ dropped, new ticket
//!     │      expire(ticket)                      │
//!     └──────────────────────────────────────────┘
//! ```
//!
//! The buffer owns its scheduler. Arming schedules a ticket; the host hands
//! the ticket back through [`UndoBuffer::expire`] when the countdown ends.
//! Tickets from a replaced or fired entry are stale and ignored, so a late
//! timer can never discard a newer undo opportunity.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crowdly_blocks::{Block, BlockKind};

/// Identifies one arming of the undo buffer.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UndoTicket(u64);

/// What the pending undo would bring back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoLabel {
    /// A single block was deleted.
    Deleted(BlockKind),
    /// A chapter went together with its trailing paragraphs.
    Section { paragraphs: usize },
}

impl fmt::Display for UndoLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoLabel::Deleted(BlockKind::Title) => f.write_str("Title deleted"),
            UndoLabel::Deleted(BlockKind::Chapter) => f.write_str("Chapter deleted"),
            UndoLabel::Deleted(BlockKind::Paragraph) => f.write_str("Paragraph deleted"),
            UndoLabel::Section { .. } => f.write_str("Section deleted"),
        }
    }
}

/// Timer capability for the undo countdown.
pub trait UndoScheduler {
    /// Arrange for `ticket` to come back to the host after `delay`.
    fn schedule(&mut self, ticket: UndoTicket, delay: Duration);

    /// Forget a scheduled ticket. Unknown tickets are ignored.
    fn cancel(&mut self, ticket: UndoTicket);
}

/// An armed undo entry.
#[derive(Clone, Debug, PartialEq)]
pub struct UndoEntry {
    /// Every block as it was before the delete.
    pub snapshot: Vec<Block>,
    pub label: UndoLabel,
    pub ticket: UndoTicket,
}

/// The undo controller.
pub struct UndoBuffer {
    armed: Option<UndoEntry>,
    scheduler: Box<dyn UndoScheduler>,
    window: Duration,
    next_ticket: u64,
}

impl UndoBuffer {
    pub fn new(scheduler: Box<dyn UndoScheduler>, window: Duration) -> Self {
        Self {
            armed: None,
            scheduler,
            window,
            next_ticket: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Label of the armed entry, if any.
    pub fn pending(&self) -> Option<UndoLabel> {
        self.armed.as_ref().map(|e| e.label)
    }

    /// Arm with a new snapshot, silently replacing any armed entry.
    pub fn arm(&mut self, snapshot: Vec<Block>, label: UndoLabel) -> UndoTicket {
        if let Some(previous) = self.armed.take() {
            self.scheduler.cancel(previous.ticket);
            tracing::debug!(label = %previous.label, "replaced pending undo");
        }

        let ticket = UndoTicket(self.next_ticket);
        self.next_ticket += 1;
        self.scheduler.schedule(ticket, self.window);
        self.armed = Some(UndoEntry {
            snapshot,
            label,
            ticket,
        });
        tracing::debug!(%label, ?ticket, "undo armed");
        ticket
    }

    /// Take the armed entry and stop its countdown. `None` when empty.
    pub fn fire(&mut self) -> Option<UndoEntry> {
        let entry = self.armed.take()?;
        self.scheduler.cancel(entry.ticket);
        tracing::debug!(label = %entry.label, "undo fired");
        Some(entry)
    }

    /// Countdown expiry. Returns whether an entry was discarded.
    pub fn expire(&mut self, ticket: UndoTicket) -> bool {
        if !self.armed.as_ref().is_some_and(|e| e.ticket == ticket) {
            return false;
        }
        if let Some(entry) = self.armed.take() {
            tracing::debug!(label = %entry.label, "undo expired");
        }
        true
    }

    /// Drop the armed entry without restoring it.
    pub fn disarm(&mut self) -> bool {
        match self.armed.take() {
            Some(entry) => {
                self.scheduler.cancel(entry.ticket);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Schedulers
// ============================================================================

#[derive(Default)]
struct ManualClock {
    now: Duration,
    due: BTreeMap<UndoTicket, Duration>,
}

/// Virtual-time scheduler for tests and deterministic hosts.
///
/// Clones share one clock: hand one clone to the editor and keep another to
/// drive time with [`ManualScheduler::advance`].
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<ManualClock>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward; returns tickets that came due, earliest first.
    pub fn advance(&self, by: Duration) -> Vec<UndoTicket> {
        let mut clock = self.clock.lock();
        clock.now += by;
        let now = clock.now;

        let mut fired: Vec<(Duration, UndoTicket)> = clock
            .due
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(ticket, at)| (*at, *ticket))
            .collect();
        fired.sort();
        for (_, ticket) in &fired {
            clock.due.remove(ticket);
        }
        fired.into_iter().map(|(_, ticket)| ticket).collect()
    }

    /// Number of scheduled, not yet due tickets.
    pub fn pending(&self) -> usize {
        self.clock.lock().due.len()
    }
}

impl UndoScheduler for ManualScheduler {
    fn schedule(&mut self, ticket: UndoTicket, delay: Duration) {
        let mut clock = self.clock.lock();
        let at = clock.now + delay;
        clock.due.insert(ticket, at);
    }

    fn cancel(&mut self, ticket: UndoTicket) {
        self.clock.lock().due.remove(&ticket);
    }
}

/// Real countdown on the tokio runtime.
///
/// Each armed ticket gets a sleeping task; when it wakes the ticket is sent
/// over the channel returned by [`TokioUndoScheduler::new`], for the host's
/// event loop to pass to the editor.
pub struct TokioUndoScheduler {
    runtime: tokio::runtime::Handle,
    tx: mpsc::UnboundedSender<UndoTicket>,
    timers: HashMap<UndoTicket, JoinHandle<()>>,
}

impl TokioUndoScheduler {
    pub fn new(runtime: tokio::runtime::Handle) -> (Self, mpsc::UnboundedReceiver<UndoTicket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            runtime,
            tx,
            timers: HashMap::new(),
        };
        (scheduler, rx)
    }
}

impl UndoScheduler for TokioUndoScheduler {
    fn schedule(&mut self, ticket: UndoTicket, delay: Duration) {
        self.timers.retain(|_, handle| !handle.is_finished());

        // Deadline is fixed now, not when the task first runs.
        let _guard = self.runtime.enter();
        let sleep = tokio::time::sleep(delay);
        let tx = self.tx.clone();
        let handle = self.runtime.spawn(async move {
            sleep.await;
            tx.send(ticket).ok();
        });

        if let Some(old) = self.timers.insert(ticket, handle) {
            old.abort();
        }
    }

    fn cancel(&mut self, ticket: UndoTicket) {
        if let Some(handle) = self.timers.remove(&ticket) {
            handle.abort();
        }
    }
}

impl Drop for TokioUndoScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
