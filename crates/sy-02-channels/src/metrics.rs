//! Channel counters and snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Thread-safe channel counters.
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    /// Messages accepted
    pub sent: AtomicU64,
    /// Messages handed to a receiver (or dispatched, for pub-sub)
    pub received: AtomicU64,
    /// Sends that were refused (full, invalid header, or failed dispatch)
    pub rejected: AtomicU64,
    /// Messages removed by `clear` or `purge`
    pub purged: AtomicU64,
}

impl ChannelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_purged(&self, count: usize) {
        self.purged
            .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
    }
}

/// Point-in-time view of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub name: String,
    /// `None` for unbounded and subscribable channels.
    pub capacity: Option<usize>,
    pub queued: usize,
    pub sent: u64,
    pub received: u64,
    pub rejected: u64,
    pub purged: u64,
}

impl ChannelStats {
    pub(crate) fn capture(
        name: &str,
        capacity: Option<usize>,
        queued: usize,
        metrics: &ChannelMetrics,
    ) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            queued,
            sent: metrics.sent.load(Ordering::Relaxed),
            received: metrics.received.load(Ordering::Relaxed),
            rejected: metrics.rejected.load(Ordering::Relaxed),
            purged: metrics.purged.load(Ordering::Relaxed),
        }
    }
}
