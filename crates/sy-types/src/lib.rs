//! # Shared Types Crate
//!
//! Contains the message model and the ports every Switchyard subsystem agrees on.
//!
//! ## Design Principles
//!
//! - **Immutable Messages**: a `Message<T>` never changes after construction.
//!   Derived messages come from `MessageBuilder::from_message`, which shares the
//!   payload and copies the headers.
//! - **Typed Header Access**: headers are a tagged union (`HeaderValue`). Reading
//!   a header as the wrong type fails with `HeaderError::TypeMismatch` instead of
//!   coercing silently.
//! - **Ports, not wiring**: `MessageChannel`, `PollableChannel`,
//!   `SubscribableChannel`, `MessageHandler` and `DestinationResolver` are the
//!   only seams external components are expected to implement or call.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod channel;
pub mod errors;
pub mod handler;
pub mod headers;
pub mod message;
pub mod timeout;

pub use channel::{
    DestinationResolver, MessageChannel, PollableChannel, SubscribableChannel, SubscriptionHandle,
};
pub use errors::{BoxError, ChannelError, HeaderError};
pub use handler::{consumer, handler_fn, Consumer, FnHandler, HandlerError, MessageHandler};
pub use headers::{keys, FromHeaderValue, HeaderValue, MessageHeaders};
pub use message::{Message, MessageBuilder};
pub use timeout::Deadline;
