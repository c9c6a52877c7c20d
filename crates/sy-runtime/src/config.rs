//! # Runtime Configuration
//!
//! Everything the pipeline needs, loaded from `SY_*` environment variables.
//! Unset variables fall back to defaults; set but unparsable variables are
//! an error rather than being silently ignored.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sy_02_channels::{Capacity, ChannelConfig};
use sy_03_session_pool::PoolConfig;
use sy_04_remote_transfer::{FileExistsMode, TransferConfig};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    #[error("{key}={value:?} is not valid: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid runtime configuration: {0}")]
    Invalid(String),
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory scanned for files to deliver.
    pub source_dir: PathBuf,
    /// Root of the local "remote" store.
    pub target_dir: PathBuf,
    /// Maximum pooled sessions.
    pub pool_size: usize,
    /// How long a worker waits for a session (`None` = forever).
    pub pool_wait: Option<Duration>,
    /// Blocking worker tasks draining the inbound channel.
    pub workers: usize,
    /// Inbound channel capacity.
    pub channel_capacity: Capacity,
    pub exists_mode: FileExistsMode,
    /// Worker poll interval while the inbound channel is empty.
    pub poll_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./inbox"),
            target_dir: PathBuf::from("./outbox"),
            pool_size: 4,
            pool_wait: Some(Duration::from_secs(5)),
            workers: 2,
            channel_capacity: Capacity::default(),
            exists_mode: FileExistsMode::default(),
            poll_interval: Duration::from_millis(50),
        }
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, RuntimeConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| RuntimeConfigError::InvalidValue {
            key,
            reason: e.to_string(),
            value,
        })
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SY_SOURCE_DIR`: directory to scan (default: ./inbox)
    /// - `SY_TARGET_DIR`: delivery root (default: ./outbox)
    /// - `SY_POOL_SIZE`: pooled sessions (default: 4)
    /// - `SY_POOL_WAIT_MS`: session wait; negative waits forever (default: 5000)
    /// - `SY_WORKERS`: worker count (default: 2)
    /// - `SY_CHANNEL_CAPACITY`: inbound capacity; 0 or negative is unbounded (default: 1000)
    /// - `SY_EXISTS_MODE`: REPLACE, APPEND, FAIL or IGNORE (default: REPLACE)
    pub fn from_env() -> Result<Self, RuntimeConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, RuntimeConfigError> {
        let mut config = Self::default();

        if let Some(dir) = lookup("SY_SOURCE_DIR") {
            config.source_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("SY_TARGET_DIR") {
            config.target_dir = PathBuf::from(dir);
        }
        if let Some(size) = lookup("SY_POOL_SIZE") {
            config.pool_size = parse("SY_POOL_SIZE", size)?;
        }
        if let Some(wait) = lookup("SY_POOL_WAIT_MS") {
            let millis: i64 = parse("SY_POOL_WAIT_MS", wait)?;
            config.pool_wait = u64::try_from(millis).ok().map(Duration::from_millis);
        }
        if let Some(workers) = lookup("SY_WORKERS") {
            config.workers = parse("SY_WORKERS", workers)?;
        }
        if let Some(capacity) = lookup("SY_CHANNEL_CAPACITY") {
            config.channel_capacity = Capacity::from_i64(parse("SY_CHANNEL_CAPACITY", capacity)?);
        }
        if let Some(mode) = lookup("SY_EXISTS_MODE") {
            config.exists_mode = parse("SY_EXISTS_MODE", mode)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), RuntimeConfigError> {
        if self.workers == 0 {
            return Err(RuntimeConfigError::Invalid(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(RuntimeConfigError::Invalid(
                "poll_interval must be non-zero".to_string(),
            ));
        }
        if self.source_dir == self.target_dir {
            return Err(RuntimeConfigError::Invalid(
                "source_dir and target_dir must differ".to_string(),
            ));
        }
        self.pool_config()
            .validate()
            .map_err(|e| RuntimeConfigError::Invalid(e.to_string()))?;
        self.channel_config()
            .validate()
            .map_err(|e| RuntimeConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_size: self.pool_size,
            wait_timeout: self.pool_wait,
        }
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            name: "inbound".to_string(),
            capacity: self.channel_capacity,
        }
    }

    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            exists_mode: self.exists_mode,
            ..TransferConfig::default()
        }
    }
}
