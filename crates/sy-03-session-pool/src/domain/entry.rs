//! Pool entries and their lifecycle.
//!
//! ```text
//! CREATED ──► IN_USE ──► IDLE ──► IN_USE ──► ... ──► DISCARDED
//!                 └──────────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a pooled session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Slot reserved, session being opened.
    Created,
    /// In the pool, ready for reuse.
    Idle,
    /// Held by a `PooledSession`.
    InUse,
    /// Closed and removed from the pool.
    Discarded,
}

/// Bookkeeping for one underlying session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolEntry {
    id: u64,
    generation: u64,
    created_at: Instant,
    times_reused: u64,
    state: EntryState,
}

impl PoolEntry {
    pub(crate) fn new(id: u64, generation: u64) -> Self {
        Self {
            id,
            generation,
            created_at: Instant::now(),
            times_reused: 0,
            state: EntryState::Created,
        }
    }

    /// Stable identity of the underlying session.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cache generation the session was opened in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// How many times the session was handed out again after its first use.
    pub fn times_reused(&self) -> u64 {
        self.times_reused
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub(crate) fn mark_in_use(&mut self) {
        if self.state == EntryState::Idle {
            self.times_reused += 1;
        }
        self.state = EntryState::InUse;
    }

    pub(crate) fn mark_idle(&mut self) {
        self.state = EntryState::Idle;
    }

    pub(crate) fn mark_discarded(&mut self) {
        self.state = EntryState::Discarded;
    }
}
