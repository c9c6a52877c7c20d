//! # SY-03 Session Pool
//!
//! Bounded cache of expensive remote sessions shared through blocking
//! acquire/release.
//!
//! ## Architecture
//!
//! - **Ports** (`ports/`): `Session` and `SessionFactory`, implemented by
//!   transport adapters
//! - **Domain** (`domain/`): `PoolConfig`, entry lifecycle, slot accounting
//!   (`PoolState`); no I/O, no locks
//! - **Service** (`service/`): `CachingSessionFactory` (the pool) and
//!   `PooledSession` (the handle)
//!
//! ## Invariants
//!
//! - idle + outstanding never exceeds `max_size` (except while draining a shrink)
//! - a session whose liveness probe fails is never handed out
//! - an abandoned or failed acquire never leaks an outstanding slot
//! - session I/O never happens while the pool lock is held
//!
//! ## Usage Example
//!
//! ```ignore
//! use sy_03_session_pool::{CachingSessionFactory, PoolConfigBuilder, Session};
//!
//! let pool = CachingSessionFactory::new(factory, PoolConfigBuilder::new().max_size(4).build()?)?;
//! let mut session = pool.acquire()?;
//! session.mkdir("/out")?;
//! drop(session); // back to the pool
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{EntryState, PoolConfig, PoolConfigBuilder, PoolEntry, DEFAULT_MAX_SIZE};
pub use error::PoolError;
pub use metrics::{PoolMetrics, PoolStats};
pub use ports::{Session, SessionError, SessionFactory};
pub use service::{CachingSessionFactory, PooledSession};
