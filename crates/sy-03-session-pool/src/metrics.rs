//! Pool counters and snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::PoolState;

/// Thread-safe pool counters.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Sessions opened through the factory
    pub created: AtomicU64,
    /// Idle sessions handed out again
    pub reused: AtomicU64,
    /// Idle sessions found dead on acquire
    pub stale_discarded: AtomicU64,
    /// Sessions closed on release (dirty, dead, surplus, stale generation, pool closed)
    pub discarded: AtomicU64,
    /// Sessions returned to idle
    pub released: AtomicU64,
    /// Acquires that timed out
    pub exhausted: AtomicU64,
    /// Factory failures
    pub factory_failures: AtomicU64,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reused(&self) {
        self.reused.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale_discarded(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: usize) {
        self.discarded
            .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub(crate) fn record_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_factory_failure(&self) {
        self.factory_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub max_size: usize,
    pub idle: usize,
    pub outstanding: usize,
    /// `idle + outstanding`
    pub allocated: usize,
    pub generation: u64,
    pub closed: bool,
    pub created: u64,
    pub reused: u64,
    pub stale_discarded: u64,
    pub discarded: u64,
    pub released: u64,
    pub exhausted: u64,
    pub factory_failures: u64,
}

impl PoolStats {
    pub(crate) fn capture<S>(state: &PoolState<S>, metrics: &PoolMetrics) -> Self {
        Self {
            max_size: state.max_size(),
            idle: state.idle(),
            outstanding: state.outstanding(),
            allocated: state.allocated(),
            generation: state.generation(),
            closed: state.is_closed(),
            created: metrics.created.load(Ordering::Relaxed),
            reused: metrics.reused.load(Ordering::Relaxed),
            stale_discarded: metrics.stale_discarded.load(Ordering::Relaxed),
            discarded: metrics.discarded.load(Ordering::Relaxed),
            released: metrics.released.load(Ordering::Relaxed),
            exhausted: metrics.exhausted.load(Ordering::Relaxed),
            factory_failures: metrics.factory_failures.load(Ordering::Relaxed),
        }
    }
}
