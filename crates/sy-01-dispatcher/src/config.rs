//! Dispatcher configuration.
//!
//! # Example
//!
//! ```ignore
//! use sy_01_dispatcher::{DispatcherConfigBuilder, FailurePolicy};
//!
//! let config = DispatcherConfigBuilder::new()
//!     .failure_policy(FailurePolicy::CollectAndContinue)
//!     .apply_sequence(true)
//!     .min_subscribers(1)
//!     .reply_timeout(Duration::from_millis(250))
//!     .build();
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wait for room in a reply channel.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(1);

fn default_reply_timeout() -> Option<Duration> {
    Some(DEFAULT_REPLY_TIMEOUT)
}

/// What happens when a subscriber fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the first failure; later subscribers are skipped.
    #[default]
    Propagate,
    /// Run every subscriber, then report all failures together.
    CollectAndContinue,
}

/// How subscribers are invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// One after another on the calling thread, in registration order.
    #[default]
    Synchronous,
    /// In parallel on the rayon pool; no ordering across subscribers.
    Concurrent,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Failure handling policy.
    pub failure_policy: FailurePolicy,
    /// Invocation mode.
    pub mode: DispatchMode,
    /// Stamp `sequence-number`, `sequence-size` and `correlation-id` on each copy.
    pub apply_sequence: bool,
    /// Dispatch fails when fewer subscribers are registered.
    pub min_subscribers: usize,
    /// How long a reply may wait for room in its channel (`None` = forever).
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            mode: DispatchMode::default(),
            apply_sequence: false,
            min_subscribers: 0,
            reply_timeout: default_reply_timeout(),
        }
    }
}

impl DispatcherConfig {
    /// Builder-style method to set the failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Builder-style method to set the dispatch mode
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Fluent builder for `DispatcherConfig`.
#[derive(Debug, Default)]
pub struct DispatcherConfigBuilder {
    failure_policy: Option<FailurePolicy>,
    mode: Option<DispatchMode>,
    apply_sequence: Option<bool>,
    min_subscribers: Option<usize>,
    reply_timeout: Option<Option<Duration>>,
}

impl DispatcherConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure policy
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Set the dispatch mode
    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Enable or disable sequence headers
    pub fn apply_sequence(mut self, apply: bool) -> Self {
        self.apply_sequence = Some(apply);
        self
    }

    /// Set the minimum number of subscribers
    pub fn min_subscribers(mut self, min: usize) -> Self {
        self.min_subscribers = Some(min);
        self
    }

    /// Bound the wait for room in a full reply channel
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(Some(timeout));
        self
    }

    /// Let replies wait for room indefinitely
    pub fn reply_wait_forever(mut self) -> Self {
        self.reply_timeout = Some(None);
        self
    }

    /// Build the configuration. Every combination is valid.
    pub fn build(self) -> DispatcherConfig {
        let defaults = DispatcherConfig::default();
        DispatcherConfig {
            failure_policy: self.failure_policy.unwrap_or(defaults.failure_policy),
            mode: self.mode.unwrap_or(defaults.mode),
            apply_sequence: self.apply_sequence.unwrap_or(defaults.apply_sequence),
            min_subscribers: self.min_subscribers.unwrap_or(defaults.min_subscribers),
            reply_timeout: self.reply_timeout.unwrap_or(defaults.reply_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_synchronous_and_propagating() {
        let config = DispatcherConfig::default();
        assert_eq!(config.failure_policy, FailurePolicy::Propagate);
        assert_eq!(config.mode, DispatchMode::Synchronous);
        assert!(!config.apply_sequence);
        assert_eq!(config.min_subscribers, 0);
        assert_eq!(config.reply_timeout, Some(DEFAULT_REPLY_TIMEOUT));
    }

    #[test]
    fn test_builder_overrides() {
        let config = DispatcherConfigBuilder::new()
            .failure_policy(FailurePolicy::CollectAndContinue)
            .mode(DispatchMode::Concurrent)
            .apply_sequence(true)
            .min_subscribers(2)
            .reply_timeout(Duration::from_millis(20))
            .build();
        assert_eq!(config.failure_policy, FailurePolicy::CollectAndContinue);
        assert_eq!(config.mode, DispatchMode::Concurrent);
        assert!(config.apply_sequence);
        assert_eq!(config.min_subscribers, 2);
        assert_eq!(config.reply_timeout, Some(Duration::from_millis(20)));

        let forever = DispatcherConfigBuilder::new().reply_wait_forever().build();
        assert_eq!(forever.reply_timeout, None);
    }

    #[test]
    fn test_config_deserializes_from_json() {
        let config: DispatcherConfig = serde_json::from_str(
            r#"{"failure_policy":"collect_and_continue","mode":"synchronous","apply_sequence":false,"min_subscribers":1}"#,
        )
        .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::CollectAndContinue);
        assert_eq!(config.min_subscribers, 1);
        assert_eq!(config.reply_timeout, Some(DEFAULT_REPLY_TIMEOUT));
    }
}
