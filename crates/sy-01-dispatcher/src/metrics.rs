//! Dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Thread-safe dispatch counters.
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Messages dispatched (one per `dispatch` call that reached subscribers)
    pub dispatches: AtomicU64,
    /// Successful subscriber invocations
    pub deliveries: AtomicU64,
    /// Failed subscriber invocations
    pub failures: AtomicU64,
    /// Replies routed to a reply channel
    pub replies: AtomicU64,
}

impl DispatcherMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_dispatch(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reply(&self) {
        self.replies.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStats {
    pub subscribers: usize,
    pub dispatches: u64,
    pub deliveries: u64,
    pub failures: u64,
    pub replies: u64,
}

impl DispatcherStats {
    pub(crate) fn capture(subscribers: usize, metrics: &DispatcherMetrics) -> Self {
        Self {
            subscribers,
            dispatches: metrics.dispatches.load(Ordering::Relaxed),
            deliveries: metrics.deliveries.load(Ordering::Relaxed),
            failures: metrics.failures.load(Ordering::Relaxed),
            replies: metrics.replies.load(Ordering::Relaxed),
        }
    }
}
