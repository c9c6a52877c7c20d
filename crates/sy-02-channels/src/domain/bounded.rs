//! Blocking bounded queue over a `MessageStore`.
//!
//! One mutex guards the store; two condition variables wake senders
//! (`not_full`) and receivers (`not_empty`). A successful send wakes at most
//! one receiver and a successful receive wakes at most one sender.

use std::marker::PhantomData;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use sy_types::{Deadline, Message};

use crate::config::Capacity;
use crate::domain::store::MessageStore;
use crate::error::SendError;

pub struct BoundedQueue<T, S> {
    store: Mutex<S>,
    capacity: Capacity,
    not_empty: Condvar,
    not_full: Condvar,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S: MessageStore<T>> BoundedQueue<T, S> {
    pub fn new(store: S, capacity: Capacity) -> Self {
        Self {
            store: Mutex::new(store),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            _marker: PhantomData,
        }
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Enqueue, waiting up to `timeout` for a free slot.
    pub fn offer(&self, message: Message<T>, timeout: Option<Duration>) -> Result<(), SendError<T>> {
        let deadline = Deadline::after(timeout);
        let mut store = self.store.lock();

        if let Err(source) = store.admit(&message) {
            return Err(SendError::InvalidHeader { message, source });
        }

        if let Capacity::Bounded(capacity) = self.capacity {
            while store.len() >= capacity {
                if deadline.expired() {
                    return Err(SendError::CapacityExceeded { message, capacity });
                }
                deadline.wait(&self.not_full, &mut store);
            }
        }

        store.push(message);
        drop(store);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Dequeue, waiting up to `timeout` for a message.
    pub fn poll(&self, timeout: Option<Duration>) -> Option<Message<T>> {
        let deadline = Deadline::after(timeout);
        let mut store = self.store.lock();

        loop {
            if let Some(message) = store.pop() {
                drop(store);
                self.not_full.notify_one();
                return Some(message);
            }
            if deadline.expired() {
                return None;
            }
            deadline.wait(&self.not_empty, &mut store);
        }
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        self.capacity.remaining(self.len())
    }

    /// Drop all queued messages and wake every blocked sender.
    pub fn clear(&self) -> usize {
        let removed = self.store.lock().clear();
        if removed > 0 {
            self.not_full.notify_all();
        }
        removed
    }

    /// Remove queued messages matching `matches` and wake blocked senders.
    pub fn purge(&self, mut matches: impl FnMut(&Message<T>) -> bool) -> Vec<Message<T>> {
        let removed = self.store.lock().remove_matching(&mut matches);
        if !removed.is_empty() {
            self.not_full.notify_all();
        }
        removed
    }
}
