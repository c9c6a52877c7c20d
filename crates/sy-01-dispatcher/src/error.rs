//! Error types for the dispatcher

use sy_types::{ChannelError, HandlerError, HeaderError, SubscriptionHandle};
use thiserror::Error;

/// Errors that can occur while dispatching a message
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Subscriber {subscriber} failed: {source}")]
    Subscriber {
        subscriber: SubscriptionHandle,
        #[source]
        source: HandlerError,
    },

    #[error("Dispatch requires at least {required} subscribers, found {actual}")]
    NotEnoughSubscribers { required: usize, actual: usize },

    #[error("Subscriber {subscriber} replied but the message has no reply channel")]
    NoReplyChannel { subscriber: SubscriptionHandle },

    #[error("Reply channel '{name}' could not be resolved")]
    UnknownChannel { name: String },

    #[error("Reply channel '{channel}' did not accept the reply")]
    ReplyRejected { channel: String },

    #[error("Reply delivery to '{channel}' failed: {source}")]
    ReplyDelivery {
        channel: String,
        #[source]
        source: ChannelError,
    },

    #[error("Invalid header: {0}")]
    Header(#[from] HeaderError),

    #[error("{} subscribers failed", .0.len())]
    Aggregate(Vec<DispatchError>),
}

impl DispatchError {
    /// Number of individual failures this error represents.
    pub fn failure_count(&self) -> usize {
        match self {
            DispatchError::Aggregate(errors) => errors.len(),
            _ => 1,
        }
    }
}
