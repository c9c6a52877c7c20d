//! Error types for message channels

use sy_types::{HeaderError, Message};
use thiserror::Error;

/// Why `offer` did not enqueue a message. The message is handed back.
#[derive(Debug, Error)]
pub enum SendError<T> {
    /// The channel stayed full for the whole wait.
    #[error("Channel is full (capacity {capacity})")]
    CapacityExceeded { message: Message<T>, capacity: usize },

    /// The message carries a header the channel cannot order by.
    #[error("Message rejected: {source}")]
    InvalidHeader {
        message: Message<T>,
        #[source]
        source: HeaderError,
    },
}

impl<T> SendError<T> {
    /// Recover the message that was not sent.
    pub fn into_message(self) -> Message<T> {
        match self {
            SendError::CapacityExceeded { message, .. } => message,
            SendError::InvalidHeader { message, .. } => message,
        }
    }
}

/// Invalid channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelConfigError {
    #[error("Channel name must not be empty")]
    EmptyName,

    #[error("Channel '{name}' has a bounded capacity of zero")]
    ZeroCapacity { name: String },
}
