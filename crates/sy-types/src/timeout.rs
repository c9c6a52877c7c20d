//! Deadlines for blocking operations.
//!
//! Every blocking call in the workspace takes an `Option<Duration>`:
//! `None` waits forever, `Some(Duration::ZERO)` polls once.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, MutexGuard};

/// When a blocking wait must give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Poll once, never wait.
    Immediate,
    /// Give up at this instant.
    At(Instant),
    /// Wait forever.
    Never,
}

impl Deadline {
    /// Deadline for a wait of `timeout` starting now.
    pub fn after(timeout: Option<Duration>) -> Self {
        match timeout {
            None => Deadline::Never,
            Some(d) if d.is_zero() => Deadline::Immediate,
            Some(d) => Instant::now()
                .checked_add(d)
                .map_or(Deadline::Never, Deadline::At),
        }
    }

    /// Whether the caller should stop waiting.
    pub fn expired(&self) -> bool {
        match self {
            Deadline::Immediate => true,
            Deadline::At(at) => Instant::now() >= *at,
            Deadline::Never => false,
        }
    }

    /// Block on `condvar` until notified or the deadline passes.
    ///
    /// Callers re-check their condition and `expired()` after every return;
    /// wake-ups may be spurious.
    pub fn wait<S>(&self, condvar: &Condvar, guard: &mut MutexGuard<'_, S>) {
        match self {
            Deadline::Immediate => {}
            Deadline::At(at) => {
                let _ = condvar.wait_until(guard, *at);
            }
            Deadline::Never => condvar.wait(guard),
        }
    }
}
