//! Domain Layer
//!
//! Pure pool logic: configuration, entry lifecycle and slot accounting.

pub mod config;
pub mod entry;
pub mod state;

pub use config::{PoolConfig, PoolConfigBuilder, DEFAULT_MAX_SIZE};
pub use entry::{EntryState, PoolEntry};
pub use state::{Checkin, Checkout, DiscardReason, PoolState};
