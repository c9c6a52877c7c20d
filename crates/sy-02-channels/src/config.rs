//! Channel configuration.

use serde::{Deserialize, Serialize};

use crate::error::ChannelConfigError;

/// Default capacity for buffered channels.
pub const DEFAULT_CAPACITY: usize = 1_000;

/// How many messages a buffered channel may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capacity {
    /// At most this many messages; senders block when full.
    Bounded(usize),
    /// No backpressure.
    Unbounded,
}

impl Capacity {
    /// Interpret a signed capacity: anything `<= 0` is unbounded.
    pub fn from_i64(capacity: i64) -> Self {
        match usize::try_from(capacity) {
            Ok(0) | Err(_) => Capacity::Unbounded,
            Ok(n) => Capacity::Bounded(n),
        }
    }

    /// The bound, if any.
    pub fn limit(&self) -> Option<usize> {
        match self {
            Capacity::Bounded(n) => Some(*n),
            Capacity::Unbounded => None,
        }
    }

    /// Free slots given `occupied` messages; `usize::MAX` when unbounded.
    pub fn remaining(&self, occupied: usize) -> usize {
        match self {
            Capacity::Bounded(n) => n.saturating_sub(occupied),
            Capacity::Unbounded => usize::MAX,
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Bounded(DEFAULT_CAPACITY)
    }
}

/// Configuration of a buffered channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel name, unique within a `ChannelRegistry`.
    pub name: String,
    /// Buffer capacity.
    #[serde(default)]
    pub capacity: Capacity,
}

impl ChannelConfig {
    /// Bounded channel config.
    pub fn bounded(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity: Capacity::Bounded(capacity),
        }
    }

    /// Unbounded channel config.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: Capacity::Unbounded,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ChannelConfigError> {
        if self.name.trim().is_empty() {
            return Err(ChannelConfigError::EmptyName);
        }
        if self.capacity == Capacity::Bounded(0) {
            return Err(ChannelConfigError::ZeroCapacity {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Fluent builder for `ChannelConfig`.
#[derive(Debug, Default)]
pub struct ChannelConfigBuilder {
    name: Option<String>,
    capacity: Option<Capacity>,
}

impl ChannelConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the channel name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the capacity
    pub fn capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the capacity from a signed value (`<= 0` means unbounded)
    pub fn capacity_i64(self, capacity: i64) -> Self {
        self.capacity(Capacity::from_i64(capacity))
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ChannelConfig, ChannelConfigError> {
        let config = ChannelConfig {
            name: self.name.unwrap_or_default(),
            capacity: self.capacity.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}
