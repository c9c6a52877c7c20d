//! # Channel Ports
//!
//! The producer/consumer interface every channel implementation exposes.
//!
//! - `MessageChannel`: anything a message can be sent to.
//! - `PollableChannel`: buffered channels a consumer pulls from.
//! - `SubscribableChannel`: channels that push to registered handlers.
//! - `DestinationResolver`: turns a channel name (e.g. a `reply-channel`
//!   header) into a channel reference.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ChannelError;
use crate::handler::MessageHandler;
use crate::message::Message;

/// Anything a message can be sent to.
pub trait MessageChannel<T>: Send + Sync {
    /// Channel name, used for logging and name-based resolution.
    fn name(&self) -> &str;

    /// Send a message, waiting up to `timeout` for capacity.
    ///
    /// - `None` waits forever
    /// - `Some(Duration::ZERO)` never blocks
    ///
    /// Returns `Ok(false)` when the channel stayed full for the whole wait.
    fn send_timeout(
        &self,
        message: Message<T>,
        timeout: Option<Duration>,
    ) -> Result<bool, ChannelError>;

    /// Send, waiting as long as it takes.
    fn send(&self, message: Message<T>) -> Result<bool, ChannelError> {
        self.send_timeout(message, None)
    }

    /// Send without blocking.
    fn try_send(&self, message: Message<T>) -> Result<bool, ChannelError> {
        self.send_timeout(message, Some(Duration::ZERO))
    }
}

/// A buffered channel consumers pull messages from.
pub trait PollableChannel<T>: MessageChannel<T> {
    /// Receive the next message, waiting up to `timeout` (`None` = forever).
    ///
    /// An empty channel after the wait yields `None`.
    fn receive_timeout(&self, timeout: Option<Duration>) -> Option<Message<T>>;

    /// Receive, waiting as long as it takes.
    fn receive(&self) -> Option<Message<T>> {
        self.receive_timeout(None)
    }

    /// Receive without blocking.
    fn try_receive(&self) -> Option<Message<T>> {
        self.receive_timeout(Some(Duration::ZERO))
    }

    /// `capacity - occupied`; `usize::MAX` for unbounded channels.
    fn remaining_capacity(&self) -> usize;
}

/// Identifies one subscription on a subscribable channel or dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    /// Wrap a raw subscription id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw subscription id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A channel that pushes messages to registered handlers.
pub trait SubscribableChannel<T>: MessageChannel<T> {
    /// Register a handler; it is invoked after every handler registered before it.
    fn subscribe(&self, handler: Arc<dyn MessageHandler<T>>) -> SubscriptionHandle;

    /// Remove a handler. Returns `false` if the handle was unknown.
    fn unsubscribe(&self, handle: SubscriptionHandle) -> bool;
}

/// Resolves channel names to channel references.
pub trait DestinationResolver<T>: Send + Sync {
    /// Look up a channel by name.
    fn resolve(&self, name: &str) -> Option<Arc<dyn MessageChannel<T>>>;
}
