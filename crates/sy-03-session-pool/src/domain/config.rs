//! Pool configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use sy_03_session_pool::PoolConfigBuilder;
//!
//! let config = PoolConfigBuilder::new()
//!     .max_size(4)
//!     .wait_timeout(Duration::from_secs(3))
//!     .build()?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PoolError;

/// Default number of sessions a pool may hold.
pub const DEFAULT_MAX_SIZE: usize = 10;

/// Pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Upper bound on idle + outstanding sessions.
    pub max_size: usize,
    /// How long `acquire` waits for a free slot. `None` waits forever,
    /// zero fails immediately.
    #[serde(default)]
    pub wait_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            wait_timeout: None,
        }
    }
}

impl PoolConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_size == 0 {
            return Err(PoolError::InvalidConfig(
                "max_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for `PoolConfig`.
#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    max_size: Option<usize>,
    wait_timeout: Option<Option<Duration>>,
}

impl PoolConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of sessions
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Give up acquiring after `timeout`
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(Some(timeout));
        self
    }

    /// Give up acquiring after `millis` milliseconds
    pub fn wait_timeout_millis(self, millis: u64) -> Self {
        self.wait_timeout(Duration::from_millis(millis))
    }

    /// Wait for a free slot as long as it takes
    pub fn wait_forever(mut self) -> Self {
        self.wait_timeout = Some(None);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<PoolConfig, PoolError> {
        let defaults = PoolConfig::default();
        let config = PoolConfig {
            max_size: self.max_size.unwrap_or(defaults.max_size),
            wait_timeout: self.wait_timeout.unwrap_or(defaults.wait_timeout),
        };
        config.validate()?;
        Ok(config)
    }
}
