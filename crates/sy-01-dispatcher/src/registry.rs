//! Ordered subscriber registry.
//!
//! Subscribers live in a slot vector in registration order. Removal leaves a
//! tombstone and is O(1); the vector is compacted once tombstones outnumber
//! live slots, which keeps removal O(1) amortized without disturbing order.

use std::collections::HashMap;
use std::sync::Arc;

use sy_types::{MessageHandler, SubscriptionHandle};

/// Below this many tombstones compaction is not worth it.
const MIN_TOMBSTONES_BEFORE_COMPACT: usize = 16;

/// A registered subscriber as captured by a dispatch snapshot.
pub type Subscriber<T> = (SubscriptionHandle, Arc<dyn MessageHandler<T>>);

/// Subscribers in registration order.
pub struct SubscriberRegistry<T> {
    slots: Vec<Option<Subscriber<T>>>,
    positions: HashMap<SubscriptionHandle, usize>,
    next_id: u64,
}

impl<T> Default for SubscriberRegistry<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            positions: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<T> SubscriberRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber after every existing one.
    pub fn insert(&mut self, handler: Arc<dyn MessageHandler<T>>) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new(self.next_id);
        self.next_id += 1;
        self.positions.insert(handle, self.slots.len());
        self.slots.push(Some((handle, handler)));
        handle
    }

    /// Remove a subscriber. Returns `false` if the handle is unknown.
    pub fn remove(&mut self, handle: SubscriptionHandle) -> bool {
        let Some(position) = self.positions.remove(&handle) else {
            return false;
        };
        self.slots[position] = None;

        let tombstones = self.slots.len() - self.positions.len();
        if tombstones >= MIN_TOMBSTONES_BEFORE_COMPACT && tombstones > self.positions.len() {
            self.compact();
        }
        true
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Whether the handle is registered.
    pub fn contains(&self, handle: SubscriptionHandle) -> bool {
        self.positions.contains_key(&handle)
    }

    /// Live subscribers in registration order.
    pub fn snapshot(&self) -> Vec<Subscriber<T>> {
        self.slots
            .iter()
            .flatten()
            .map(|(handle, handler)| (*handle, Arc::clone(handler)))
            .collect()
    }

    /// Live handles in registration order.
    pub fn handles(&self) -> Vec<SubscriptionHandle> {
        self.slots.iter().flatten().map(|(handle, _)| *handle).collect()
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (position, slot) in self.slots.iter().enumerate() {
            if let Some((handle, _)) = slot {
                self.positions.insert(*handle, position);
            }
        }
    }
}
