//! # Buffered Channels
//!
//! `QueueChannel` (FIFO) and `PriorityChannel` share one implementation,
//! `BufferedChannel<T, S>`, parameterized by the message store.
//!
//! ```text
//! producers ──send──► [ BoundedQueue<S> ] ──receive──► consumers
//!                       │ capacity
//!                       └ remaining_capacity() = capacity - queued
//! ```

use std::time::Duration;

use sy_types::{ChannelError, Message, MessageChannel, PollableChannel};
use tracing::debug;

use crate::config::{Capacity, ChannelConfig};
use crate::domain::{BoundedQueue, Comparator, FifoStore, MessageOrder, MessageStore, PriorityStore};
use crate::error::{ChannelConfigError, SendError};
use crate::metrics::{ChannelMetrics, ChannelStats};

/// A pollable channel backed by a message store.
pub struct BufferedChannel<T, S> {
    name: String,
    queue: BoundedQueue<T, S>,
    metrics: ChannelMetrics,
}

/// Bounded FIFO channel.
pub type QueueChannel<T> = BufferedChannel<T, FifoStore<T>>;

/// Bounded channel ordered by priority, stable for ties.
pub type PriorityChannel<T> = BufferedChannel<T, PriorityStore<T>>;

impl<T: Send + Sync> BufferedChannel<T, FifoStore<T>> {
    /// Create a FIFO channel.
    pub fn new(config: ChannelConfig) -> Result<Self, ChannelConfigError> {
        Self::with_store(config, FifoStore::new())
    }
}

impl<T: Send + Sync> BufferedChannel<T, PriorityStore<T>> {
    /// Create a channel ordered by the `priority` header.
    pub fn new(config: ChannelConfig) -> Result<Self, ChannelConfigError> {
        Self::with_store(config, PriorityStore::new())
    }

    /// Create a channel ordered by `comparator` instead of the header.
    pub fn with_comparator(
        config: ChannelConfig,
        comparator: Comparator<T>,
    ) -> Result<Self, ChannelConfigError> {
        Self::with_store(
            config,
            PriorityStore::with_order(MessageOrder::Custom(comparator)),
        )
    }
}

impl<T: Send + Sync, S: MessageStore<T>> BufferedChannel<T, S> {
    /// Create a channel over an arbitrary store.
    pub fn with_store(config: ChannelConfig, store: S) -> Result<Self, ChannelConfigError> {
        config.validate()?;
        debug!(channel = %config.name, capacity = ?config.capacity, "Channel created");
        Ok(Self {
            name: config.name,
            queue: BoundedQueue::new(store, config.capacity),
            metrics: ChannelMetrics::new(),
        })
    }

    /// Configured capacity.
    pub fn capacity(&self) -> Capacity {
        self.queue.capacity()
    }

    /// Send, handing the message back when it could not be enqueued.
    pub fn offer(&self, message: Message<T>, timeout: Option<Duration>) -> Result<(), SendError<T>> {
        let id = message.id();
        match self.queue.offer(message, timeout) {
            Ok(()) => {
                self.metrics.record_sent();
                debug!(channel = %self.name, message_id = %id, "Message enqueued");
                Ok(())
            }
            Err(err) => {
                self.metrics.record_rejected();
                debug!(channel = %self.name, message_id = %id, reason = %err, "Message not enqueued");
                Err(err)
            }
        }
    }

    /// Messages currently queued.
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Drop every queued message. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self.queue.clear();
        self.metrics.record_purged(removed);
        debug!(channel = %self.name, removed, "Channel cleared");
        removed
    }

    /// Remove and return queued messages matching `matches`.
    pub fn purge(&self, matches: impl FnMut(&Message<T>) -> bool) -> Vec<Message<T>> {
        let removed = self.queue.purge(matches);
        self.metrics.record_purged(removed.len());
        debug!(channel = %self.name, removed = removed.len(), "Channel purged");
        removed
    }

    /// Raw counters.
    pub fn metrics(&self) -> &ChannelMetrics {
        &self.metrics
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats::capture(
            &self.name,
            self.capacity().limit(),
            self.queue_size(),
            &self.metrics,
        )
    }
}

impl<T: Send + Sync, S: MessageStore<T>> MessageChannel<T> for BufferedChannel<T, S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_timeout(
        &self,
        message: Message<T>,
        timeout: Option<Duration>,
    ) -> Result<bool, ChannelError> {
        match self.offer(message, timeout) {
            Ok(()) => Ok(true),
            Err(SendError::CapacityExceeded { .. }) => Ok(false),
            Err(SendError::InvalidHeader { source, .. }) => Err(ChannelError::Header {
                channel: self.name.clone(),
                source,
            }),
        }
    }
}

impl<T: Send + Sync, S: MessageStore<T>> PollableChannel<T> for BufferedChannel<T, S> {
    fn receive_timeout(&self, timeout: Option<Duration>) -> Option<Message<T>> {
        let message = self.queue.poll(timeout)?;
        self.metrics.record_received();
        debug!(channel = %self.name, message_id = %message.id(), "Message received");
        Some(message)
    }

    fn remaining_capacity(&self) -> usize {
        self.queue.remaining()
    }
}
