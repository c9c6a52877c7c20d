//! # Message Handlers
//!
//! The subscriber side of dispatch. A handler receives a borrowed message and
//! may return a reply, which the dispatcher routes to the `reply-channel`.

use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

use crate::errors::BoxError;
use crate::message::Message;

/// Failure raised by a handler.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl HandlerError {
    /// A failure with only a description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// A failure wrapping an underlying error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The failure description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Subscriber interface implemented by external handlers.
pub trait MessageHandler<T>: Send + Sync {
    /// Handle a message, optionally producing a reply.
    fn handle(&self, message: &Message<T>) -> Result<Option<Message<T>>, HandlerError>;
}

/// Handler backed by a closure that may reply.
pub struct FnHandler<T, F> {
    f: F,
    _marker: PhantomData<fn(&Message<T>)>,
}

impl<T, F> fmt::Debug for FnHandler<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<T, F> MessageHandler<T> for FnHandler<T, F>
where
    F: Fn(&Message<T>) -> Result<Option<Message<T>>, HandlerError> + Send + Sync,
{
    fn handle(&self, message: &Message<T>) -> Result<Option<Message<T>>, HandlerError> {
        (self.f)(message)
    }
}

/// Wrap a closure as a replying handler.
pub fn handler_fn<T, F>(f: F) -> FnHandler<T, F>
where
    F: Fn(&Message<T>) -> Result<Option<Message<T>>, HandlerError> + Send + Sync,
{
    FnHandler {
        f,
        _marker: PhantomData,
    }
}

/// Handler backed by a closure that only consumes (`accept`).
pub struct Consumer<T, F> {
    f: F,
    _marker: PhantomData<fn(&Message<T>)>,
}

impl<T, F> fmt::Debug for Consumer<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer").finish_non_exhaustive()
    }
}

impl<T, F> MessageHandler<T> for Consumer<T, F>
where
    F: Fn(&Message<T>) + Send + Sync,
{
    fn handle(&self, message: &Message<T>) -> Result<Option<Message<T>>, HandlerError> {
        (self.f)(message);
        Ok(None)
    }
}

/// Wrap a closure as a non-replying handler.
pub fn consumer<T, F>(f: F) -> Consumer<T, F>
where
    F: Fn(&Message<T>) + Send + Sync,
{
    Consumer {
        f,
        _marker: PhantomData,
    }
}
