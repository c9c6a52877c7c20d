//! Error types for the session pool

use std::time::Duration;

use thiserror::Error;

use crate::ports::SessionError;

/// Errors that can occur while acquiring or managing pooled sessions
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Session pool exhausted: all {max_size} sessions in use after waiting {waited:?}")]
    Exhausted { max_size: usize, waited: Duration },

    #[error("Session pool is closed")]
    Closed,

    #[error("Failed to open session: {0}")]
    Factory(#[from] SessionError),

    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),
}
