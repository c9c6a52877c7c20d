//! Service Layer
//!
//! - `CachingSessionFactory`: the pool
//! - `PooledSession`: a checked-out session handle

pub mod pool;
pub mod pooled;

pub use pool::CachingSessionFactory;
pub use pooled::PooledSession;
