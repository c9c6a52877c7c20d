//! # Caching Session Factory
//!
//! A bounded pool of sessions opened by an underlying `SessionFactory`.
//!
//! ```text
//! acquire()
//!   │ lock
//!   ├─ idle session?        → unlock → probe is_open ─┬─ open  → hand out
//!   │                                                 └─ stale → close, free slot, retry
//!   ├─ outstanding < max?   → reserve slot → unlock → factory.create()
//!   │                                                 └─ error → free slot, wake one waiter
//!   └─ full                 → wait on condvar until deadline → PoolError::Exhausted
//! ```
//!
//! The pool mutex only guards bookkeeping. Opening, probing and closing
//! sessions always happens with the lock released.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use sy_types::Deadline;
use tracing::{debug, info, warn};

use crate::domain::{
    Checkin, Checkout, DiscardReason, EntryState, PoolConfig, PoolEntry, PoolState,
};
use crate::error::PoolError;
use crate::metrics::{PoolMetrics, PoolStats};
use crate::ports::{Session, SessionFactory};
use crate::service::pooled::{EntrySink, PooledSession};

enum Grant<S> {
    Reuse(PoolEntry, S),
    Create(PoolEntry),
}

struct PoolShared<F: SessionFactory> {
    factory: F,
    state: Mutex<PoolState<F::Session>>,
    available: Condvar,
    wait_timeout: Option<Duration>,
    metrics: PoolMetrics,
}

/// Pool of reusable sessions. Cloning yields another handle to the same pool.
pub struct CachingSessionFactory<F: SessionFactory> {
    shared: Arc<PoolShared<F>>,
}

impl<F: SessionFactory> Clone for CachingSessionFactory<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: SessionFactory + 'static> CachingSessionFactory<F> {
    /// Create a pool. No session is opened until the first `acquire`.
    pub fn new(factory: F, config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        info!(
            max_size = config.max_size,
            wait_timeout = ?config.wait_timeout,
            "Session pool created"
        );
        Ok(Self {
            shared: Arc::new(PoolShared {
                factory,
                state: Mutex::new(PoolState::new(config.max_size)),
                available: Condvar::new(),
                wait_timeout: config.wait_timeout,
                metrics: PoolMetrics::new(),
            }),
        })
    }

    /// Check out a session, waiting up to the configured `wait_timeout`.
    ///
    /// # Errors
    ///
    /// - `PoolError::Exhausted` if no slot frees up in time
    /// - `PoolError::Closed` after `close()`
    /// - `PoolError::Factory` if opening a new session fails
    pub fn acquire(&self) -> Result<PooledSession<F::Session>, PoolError> {
        self.acquire_timeout(self.shared.wait_timeout)
    }

    /// Check out a session, waiting up to `timeout` (`None` = forever).
    pub fn acquire_timeout(
        &self,
        timeout: Option<Duration>,
    ) -> Result<PooledSession<F::Session>, PoolError> {
        let started = Instant::now();
        let deadline = Deadline::after(timeout);

        loop {
            match self.shared.reserve(deadline, started)? {
                Grant::Reuse(entry, mut session) => {
                    if session.is_open() {
                        self.shared.metrics.record_reused();
                        debug!(session_id = entry.id(), "Reusing idle session");
                        return Ok(self.wrap(entry, session));
                    }
                    self.shared.metrics.record_stale_discarded();
                    debug!(session_id = entry.id(), "Discarding stale idle session");
                    close_quietly(&entry, &mut session);
                    self.shared.release_slot();
                }
                Grant::Create(mut entry) => match self.shared.factory.create() {
                    Ok(session) => {
                        entry.mark_in_use();
                        self.shared.metrics.record_created();
                        debug!(session_id = entry.id(), "Opened new session");
                        return Ok(self.wrap(entry, session));
                    }
                    Err(err) => {
                        self.shared.release_slot();
                        self.shared.metrics.record_factory_failure();
                        warn!(error = %err, "Failed to open session");
                        return Err(PoolError::Factory(err));
                    }
                },
            }
        }
    }

    /// Close every idle session and start a new generation. Sessions checked
    /// out before the reset are closed when they are released.
    pub fn reset_cache(&self) {
        let (drained, generation) = {
            let mut state = self.shared.state.lock();
            let drained = state.reset();
            (drained, state.generation())
        };
        info!(generation, closed = drained.len(), "Session cache reset");
        self.shared.close_all(drained);
    }

    /// Change the pool bound at runtime.
    ///
    /// Shrinking closes surplus idle sessions now and surplus outstanding
    /// ones on release. Growing wakes blocked acquirers.
    pub fn set_max_size(&self, max_size: usize) -> Result<(), PoolError> {
        if max_size == 0 {
            return Err(PoolError::InvalidConfig(
                "max_size must be greater than 0".to_string(),
            ));
        }
        let surplus = self.shared.state.lock().resize(max_size);
        self.shared.available.notify_all();
        info!(max_size, closed = surplus.len(), "Session pool resized");
        self.shared.close_all(surplus);
        Ok(())
    }

    /// Close the pool. Idle sessions are closed now, outstanding ones on
    /// release; blocked and future acquirers fail with `PoolError::Closed`.
    pub fn close(&self) {
        let drained = self.shared.state.lock().close();
        self.shared.available.notify_all();
        info!(closed = drained.len(), "Session pool closed");
        self.shared.close_all(drained);
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        PoolStats::capture(&*state, &self.shared.metrics)
    }

    /// Raw counters.
    pub fn metrics(&self) -> &PoolMetrics {
        &self.shared.metrics
    }

    /// The underlying factory.
    pub fn factory(&self) -> &F {
        &self.shared.factory
    }

    pub fn max_size(&self) -> usize {
        self.shared.state.lock().max_size()
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.shared.wait_timeout
    }

    fn wrap(&self, entry: PoolEntry, session: F::Session) -> PooledSession<F::Session> {
        let sink: Arc<dyn EntrySink<F::Session>> = self.shared.clone();
        PooledSession::new(entry, session, sink)
    }
}

impl<F: SessionFactory> PoolShared<F> {
    fn reserve(&self, deadline: Deadline, started: Instant) -> Result<Grant<F::Session>, PoolError> {
        let mut state = self.state.lock();
        loop {
            match state.checkout() {
                Checkout::Reuse(entry, session) => return Ok(Grant::Reuse(entry, session)),
                Checkout::Create(entry) => return Ok(Grant::Create(entry)),
                Checkout::Closed => return Err(PoolError::Closed),
                Checkout::Full => {
                    if deadline.expired() {
                        let max_size = state.max_size();
                        drop(state);
                        let waited = started.elapsed();
                        self.metrics.record_exhausted();
                        warn!(max_size, waited = ?waited, "Session pool exhausted");
                        return Err(PoolError::Exhausted { max_size, waited });
                    }
                    deadline.wait(&self.available, &mut state);
                }
            }
        }
    }

    fn release_slot(&self) {
        self.state.lock().free_slot();
        self.available.notify_one();
    }

    fn close_all(&self, entries: Vec<(PoolEntry, F::Session)>) {
        self.metrics.record_discarded(entries.len());
        for (entry, mut session) in entries {
            close_quietly(&entry, &mut session);
        }
    }
}

impl<F: SessionFactory> EntrySink<F::Session> for PoolShared<F> {
    fn give_back(&self, entry: PoolEntry, session: F::Session, dirty: bool) -> EntryState {
        let rejected = if !dirty && session.is_open() {
            match self.state.lock().checkin(entry, session) {
                Checkin::Returned => None,
                Checkin::Rejected(entry, session, reason) => Some((entry, session, reason)),
            }
        } else {
            self.state.lock().free_slot();
            let reason = if dirty {
                DiscardReason::Dirty
            } else {
                warn!(session_id = entry.id(), "Released session is no longer open");
                DiscardReason::Dead
            };
            let mut entry = entry;
            entry.mark_discarded();
            Some((entry, session, reason))
        };
        self.available.notify_one();

        match rejected {
            None => {
                self.metrics.record_released();
                debug!(session_id = entry.id(), "Session returned to pool");
                EntryState::Idle
            }
            Some((entry, mut session, reason)) => {
                self.metrics.record_discarded(1);
                debug!(session_id = entry.id(), %reason, "Session discarded");
                close_quietly(&entry, &mut session);
                EntryState::Discarded
            }
        }
    }
}

impl<F: SessionFactory> Drop for PoolShared<F> {
    fn drop(&mut self) {
        for (entry, mut session) in self.state.get_mut().close() {
            close_quietly(&entry, &mut session);
        }
    }
}

fn close_quietly<S: Session>(entry: &PoolEntry, session: &mut S) {
    if let Err(err) = session.close() {
        debug!(session_id = entry.id(), error = %err, "Error while closing session");
    }
}
