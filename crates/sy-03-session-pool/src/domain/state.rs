//! Pool bookkeeping.
//!
//! Pure state transitions, no I/O and no locking. The service holds this
//! behind one mutex and performs every session call outside it.
//!
//! Invariant: `idle + outstanding <= max_size`, except transiently after
//! `resize` shrinks below the outstanding count; the surplus drains as
//! handles are returned.

use std::collections::VecDeque;
use std::fmt;

use crate::domain::entry::PoolEntry;

/// Result of asking for a session.
#[derive(Debug)]
pub enum Checkout<S> {
    /// An idle session; its liveness is not yet verified.
    Reuse(PoolEntry, S),
    /// A slot was reserved; the caller must open a session or free the slot.
    Create(PoolEntry),
    /// Every slot is outstanding.
    Full,
    /// The pool no longer hands out sessions.
    Closed,
}

/// Why a returned session was not put back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The holder marked it dirty.
    Dirty,
    /// Its liveness probe failed.
    Dead,
    /// It predates the last cache reset.
    StaleGeneration,
    /// The pool shrank below the allocated count.
    Surplus,
    /// The pool is closed.
    PoolClosed,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DiscardReason::Dirty => "marked dirty",
            DiscardReason::Dead => "session no longer open",
            DiscardReason::StaleGeneration => "stale cache generation",
            DiscardReason::Surplus => "pool shrunk",
            DiscardReason::PoolClosed => "pool closed",
        };
        f.write_str(reason)
    }
}

/// Result of returning a session.
#[derive(Debug)]
pub enum Checkin<S> {
    Returned,
    Rejected(PoolEntry, S, DiscardReason),
}

/// Idle sessions and slot accounting.
#[derive(Debug)]
pub struct PoolState<S> {
    idle: VecDeque<(PoolEntry, S)>,
    outstanding: usize,
    max_size: usize,
    generation: u64,
    closed: bool,
    next_id: u64,
}

impl<S> PoolState<S> {
    pub fn new(max_size: usize) -> Self {
        Self {
            idle: VecDeque::new(),
            outstanding: 0,
            max_size,
            generation: 0,
            closed: false,
            next_id: 1,
        }
    }

    /// Take an idle session, or reserve a slot for a new one.
    ///
    /// The most recently returned session is reused first.
    pub fn checkout(&mut self) -> Checkout<S> {
        if self.closed {
            return Checkout::Closed;
        }
        if let Some((mut entry, session)) = self.idle.pop_back() {
            entry.mark_in_use();
            self.outstanding += 1;
            return Checkout::Reuse(entry, session);
        }
        if self.outstanding < self.max_size {
            self.outstanding += 1;
            let entry = PoolEntry::new(self.next_id, self.generation);
            self.next_id += 1;
            return Checkout::Create(entry);
        }
        Checkout::Full
    }

    /// Return an outstanding session. Frees its slot either way.
    pub fn checkin(&mut self, mut entry: PoolEntry, session: S) -> Checkin<S> {
        self.free_slot();

        let reason = if self.closed {
            Some(DiscardReason::PoolClosed)
        } else if entry.generation() != self.generation {
            Some(DiscardReason::StaleGeneration)
        } else if self.allocated() >= self.max_size {
            Some(DiscardReason::Surplus)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                entry.mark_discarded();
                Checkin::Rejected(entry, session, reason)
            }
            None => {
                entry.mark_idle();
                self.idle.push_back((entry, session));
                Checkin::Returned
            }
        }
    }

    /// Give up an outstanding slot without returning a session.
    pub fn free_slot(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    /// Change `max_size`, returning idle sessions that no longer fit.
    pub fn resize(&mut self, max_size: usize) -> Vec<(PoolEntry, S)> {
        self.max_size = max_size;
        let mut surplus = Vec::new();
        while self.allocated() > self.max_size {
            match self.idle.pop_front() {
                Some(idle) => surplus.push(idle),
                None => break,
            }
        }
        mark_all_discarded(surplus)
    }

    /// Start a new generation, returning every idle session.
    pub fn reset(&mut self) -> Vec<(PoolEntry, S)> {
        self.generation += 1;
        mark_all_discarded(self.idle.drain(..).collect())
    }

    /// Stop handing out sessions, returning every idle session.
    pub fn close(&mut self) -> Vec<(PoolEntry, S)> {
        self.closed = true;
        mark_all_discarded(self.idle.drain(..).collect())
    }

    pub fn idle(&self) -> usize {
        self.idle.len()
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Idle plus outstanding.
    pub fn allocated(&self) -> usize {
        self.idle.len() + self.outstanding
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

fn mark_all_discarded<S>(mut entries: Vec<(PoolEntry, S)>) -> Vec<(PoolEntry, S)> {
    for (entry, _) in &mut entries {
        entry.mark_discarded();
    }
    entries
}
