//! # SY-02 Channels
//!
//! In-process message channels.
//!
//! | Channel | Kind | Order | Backpressure |
//! |---------|------|-------|--------------|
//! | `QueueChannel` | pollable | FIFO | bounded, blocking with timeout |
//! | `PriorityChannel` | pollable | `priority` header (or comparator), stable | bounded, blocking with timeout |
//! | `PublishSubscribeChannel` | subscribable | registration order | none |
//!
//! ## Architecture
//!
//! - `domain::store`: FIFO and priority message stores
//! - `domain::bounded`: `BoundedQueue`, the mutex + two condvars core
//! - `buffered`: pollable channels over a store
//! - `pubsub`: channel front for `sy_01_dispatcher::BroadcastingDispatcher`
//! - `registry`: named channels, usable as a `DestinationResolver`
//!
//! ## Invariants
//!
//! - `remaining_capacity() == capacity - queued` at every observation
//! - a full channel reports `Ok(false)` from `send_timeout`, never an error
//! - no call blocks past its timeout; `None` waits forever, zero never waits

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod buffered;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod pubsub;
pub mod registry;

pub use buffered::{BufferedChannel, PriorityChannel, QueueChannel};
pub use config::{Capacity, ChannelConfig, ChannelConfigBuilder, DEFAULT_CAPACITY};
pub use domain::{Comparator, MessageOrder};
pub use error::{ChannelConfigError, SendError};
pub use metrics::{ChannelMetrics, ChannelStats};
pub use pubsub::PublishSubscribeChannel;
pub use registry::ChannelRegistry;
