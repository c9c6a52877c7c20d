//! Message stores: the ordering policy behind a buffered channel.
//!
//! Stores are plain data structures. Locking and blocking live in
//! `BoundedQueue`.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, VecDeque};
use std::fmt;
use std::sync::Arc;

use sy_types::{HeaderError, Message};

/// Orders two messages: `Ordering::Less` means `a` is received before `b`.
pub type Comparator<T> = Arc<dyn Fn(&Message<T>, &Message<T>) -> Ordering + Send + Sync>;

/// Storage and ordering for buffered messages.
pub trait MessageStore<T>: Send {
    /// Reject messages the store cannot order. Called before `push`.
    fn admit(&self, _message: &Message<T>) -> Result<(), HeaderError> {
        Ok(())
    }

    /// Add an admitted message.
    fn push(&mut self, message: Message<T>);

    /// Remove the next message in receive order.
    fn pop(&mut self) -> Option<Message<T>>;

    /// Number of stored messages.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every message, returning how many were removed.
    fn clear(&mut self) -> usize;

    /// Remove and return every message matching `matches`, keeping the
    /// relative order of the rest.
    fn remove_matching(
        &mut self,
        matches: &mut dyn FnMut(&Message<T>) -> bool,
    ) -> Vec<Message<T>>;
}

/// First in, first out.
pub struct FifoStore<T> {
    queue: VecDeque<Message<T>>,
}

impl<T> Default for FifoStore<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<T> FifoStore<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Send + Sync> MessageStore<T> for FifoStore<T> {
    fn push(&mut self, message: Message<T>) {
        self.queue.push_back(message);
    }

    fn pop(&mut self) -> Option<Message<T>> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn clear(&mut self) -> usize {
        let removed = self.queue.len();
        self.queue.clear();
        removed
    }

    fn remove_matching(
        &mut self,
        matches: &mut dyn FnMut(&Message<T>) -> bool,
    ) -> Vec<Message<T>> {
        split_off_matching(&mut self.queue, |m| matches(m))
    }
}

/// How a `PriorityStore` ranks messages.
pub enum MessageOrder<T> {
    /// By the integer `priority` header, highest first; absent means 0.
    PriorityHeader,
    /// By a caller-supplied comparator.
    Custom(Comparator<T>),
}

impl<T> Clone for MessageOrder<T> {
    fn clone(&self) -> Self {
        match self {
            MessageOrder::PriorityHeader => MessageOrder::PriorityHeader,
            MessageOrder::Custom(cmp) => MessageOrder::Custom(Arc::clone(cmp)),
        }
    }
}

impl<T> fmt::Debug for MessageOrder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageOrder::PriorityHeader => f.write_str("PriorityHeader"),
            MessageOrder::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Heap entry for custom ordering. The heap's maximum is the next message
/// to receive: the comparator's `Less` side, then the lower sequence.
struct Queued<T> {
    sequence: u64,
    message: Message<T>,
    cmp: Comparator<T>,
}

impl<T> Ord for Queued<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.cmp)(&other.message, &self.message)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl<T> PartialOrd for Queued<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Queued<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Queued<T> {}

enum Ranking<T> {
    /// Keyed by (highest priority first, insertion sequence).
    Header(BTreeMap<(Reverse<i64>, u64), Message<T>>),
    Custom {
        heap: BinaryHeap<Queued<T>>,
        cmp: Comparator<T>,
    },
}

/// Priority ordered store, stable for ties.
///
/// Every message carries an insertion sequence that breaks ties, so equal
/// ranks dequeue in insertion order. Header ordering lives in an ordered
/// map and custom ordering in a binary heap; both insert in O(log n).
pub struct PriorityStore<T> {
    ranking: Ranking<T>,
    next_sequence: u64,
}

impl<T> PriorityStore<T> {
    /// Order by the `priority` header.
    pub fn new() -> Self {
        Self::with_order(MessageOrder::PriorityHeader)
    }

    /// Order by `order`.
    pub fn with_order(order: MessageOrder<T>) -> Self {
        let ranking = match order {
            MessageOrder::PriorityHeader => Ranking::Header(BTreeMap::new()),
            MessageOrder::Custom(cmp) => Ranking::Custom {
                heap: BinaryHeap::new(),
                cmp,
            },
        };
        Self {
            ranking,
            next_sequence: 0,
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}

impl<T> Default for PriorityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> MessageStore<T> for PriorityStore<T> {
    fn admit(&self, message: &Message<T>) -> Result<(), HeaderError> {
        match self.ranking {
            Ranking::Header(_) => message.priority().map(|_| ()),
            Ranking::Custom { .. } => Ok(()),
        }
    }

    fn push(&mut self, message: Message<T>) {
        let sequence = self.next_sequence();
        match &mut self.ranking {
            Ranking::Header(entries) => {
                let priority = message.priority().unwrap_or_default();
                entries.insert((Reverse(priority), sequence), message);
            }
            Ranking::Custom { heap, cmp } => heap.push(Queued {
                sequence,
                message,
                cmp: Arc::clone(cmp),
            }),
        }
    }

    fn pop(&mut self) -> Option<Message<T>> {
        match &mut self.ranking {
            Ranking::Header(entries) => entries.pop_first().map(|(_, message)| message),
            Ranking::Custom { heap, .. } => heap.pop().map(|queued| queued.message),
        }
    }

    fn len(&self) -> usize {
        match &self.ranking {
            Ranking::Header(entries) => entries.len(),
            Ranking::Custom { heap, .. } => heap.len(),
        }
    }

    fn clear(&mut self) -> usize {
        let removed = self.len();
        match &mut self.ranking {
            Ranking::Header(entries) => entries.clear(),
            Ranking::Custom { heap, .. } => heap.clear(),
        }
        removed
    }

    fn remove_matching(
        &mut self,
        matches: &mut dyn FnMut(&Message<T>) -> bool,
    ) -> Vec<Message<T>> {
        match &mut self.ranking {
            Ranking::Header(entries) => {
                let keys: Vec<_> = entries
                    .iter()
                    .filter(|&(_, message)| matches(message))
                    .map(|(&key, _)| key)
                    .collect();
                keys.into_iter()
                    .filter_map(|key| entries.remove(&key))
                    .collect()
            }
            Ranking::Custom { heap, .. } => {
                let (mut removed, kept): (Vec<_>, Vec<_>) = std::mem::take(heap)
                    .into_vec()
                    .into_iter()
                    .partition(|queued| matches(&queued.message));
                *heap = BinaryHeap::from(kept);
                // Receive order is descending heap order.
                removed.sort_by(|a, b| b.cmp(a));
                removed.into_iter().map(|queued| queued.message).collect()
            }
        }
    }
}

fn split_off_matching<E>(
    entries: &mut VecDeque<E>,
    mut matches: impl FnMut(&E) -> bool,
) -> Vec<E> {
    let mut removed = Vec::new();
    let mut kept = VecDeque::with_capacity(entries.len());
    for entry in entries.drain(..) {
        if matches(&entry) {
            removed.push(entry);
        } else {
            kept.push_back(entry);
        }
    }
    *entries = kept;
    removed
}
