//! Domain layer: message stores and the blocking queue built on them.

pub mod bounded;
pub mod store;

pub use bounded::BoundedQueue;
pub use store::{Comparator, FifoStore, MessageOrder, MessageStore, PriorityStore};
