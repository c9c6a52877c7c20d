//! # SY-01 Dispatcher
//!
//! Ordered fan-out of one message to many subscribers. Used by
//! publish-subscribe channels and by any endpoint with several handlers.
//!
//! ## Architecture
//!
//! - `config`: `DispatcherConfig`, failure policy and dispatch mode
//! - `registry`: ordered subscriber slots with O(1) amortized removal
//! - `dispatcher`: `BroadcastingDispatcher`, the fan-out loop and reply routing
//! - `error`: `DispatchError`
//! - `metrics`: atomic counters and `DispatcherStats` snapshots
//!
//! ## Invariants
//!
//! - **ORDER**: synchronous dispatch invokes subscribers in registration order
//! - **SNAPSHOT**: the subscriber list is captured once per dispatch; concurrent
//!   subscribe/unsubscribe only affects later dispatches
//! - **NO CROSS-BLOCKING**: a subscriber producing a reply never prevents its
//!   siblings from receiving the same original message
//!
//! ## Usage Example
//!
//! ```ignore
//! use sy_01_dispatcher::{BroadcastingDispatcher, DispatcherConfig};
//! use sy_types::{consumer, Message};
//!
//! let dispatcher = BroadcastingDispatcher::new(DispatcherConfig::default());
//! dispatcher.subscribe(consumer(|m: &Message<u32>| println!("{}", m.payload())));
//! let handled = dispatcher.dispatch(&Message::new(7))?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod registry;

pub use config::{
    DispatchMode, DispatcherConfig, DispatcherConfigBuilder, FailurePolicy, DEFAULT_REPLY_TIMEOUT,
};
pub use dispatcher::BroadcastingDispatcher;
pub use error::DispatchError;
pub use metrics::{DispatcherMetrics, DispatcherStats};
pub use registry::SubscriberRegistry;
