//! # Message
//!
//! The unit of work exchanged by channels and dispatchers.
//!
//! A message is a payload plus an immutable header map. Both live behind
//! `Arc`, so cloning a message (or deriving one with
//! `MessageBuilder::from_message`) never copies the payload.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::errors::HeaderError;
use crate::headers::{keys, HeaderValue, MessageHeaders};

/// An immutable payload with headers.
pub struct Message<T> {
    payload: Arc<T>,
    headers: Arc<MessageHeaders>,
}

impl<T> Clone for Message<T> {
    fn clone(&self) -> Self {
        Self {
            payload: Arc::clone(&self.payload),
            headers: Arc::clone(&self.headers),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Message<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("payload", &self.payload)
            .field("headers", &self.headers)
            .finish()
    }
}

impl<T> Message<T> {
    /// Build a message with only the generated `id` and `timestamp` headers.
    pub fn new(payload: T) -> Self {
        MessageBuilder::with_payload(payload).build()
    }

    /// The payload.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// The header map.
    pub fn headers(&self) -> &MessageHeaders {
        &self.headers
    }

    /// Message id. Every built message has one.
    pub fn id(&self) -> Uuid {
        self.headers.id().unwrap_or_else(Uuid::nil)
    }

    /// Priority used by priority channels; absent means 0.
    pub fn priority(&self) -> Result<i64, HeaderError> {
        Ok(self.headers.priority()?.unwrap_or(0))
    }

    /// Derive a message with a transformed payload and the same headers.
    pub fn map_payload<U>(&self, f: impl FnOnce(&T) -> U) -> Message<U> {
        Message {
            payload: Arc::new(f(&self.payload)),
            headers: Arc::clone(&self.headers),
        }
    }

    /// Whether two messages share the same payload allocation.
    pub fn shares_payload_with(&self, other: &Message<T>) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

/// Builder for new and derived messages.
///
/// # Example
///
/// ```ignore
/// let original = MessageBuilder::with_payload("hello")
///     .priority(5)
///     .reply_channel("replies")
///     .build();
///
/// let derived = MessageBuilder::from_message(&original)
///     .set_header("stage", "enriched")
///     .build();
/// ```
pub struct MessageBuilder<T> {
    payload: Arc<T>,
    headers: BTreeMap<String, HeaderValue>,
}

impl<T> MessageBuilder<T> {
    /// Start a builder for a fresh payload.
    pub fn with_payload(payload: T) -> Self {
        Self {
            payload: Arc::new(payload),
            headers: BTreeMap::new(),
        }
    }

    /// Start a builder from an existing message (copy-with-override).
    ///
    /// The payload is shared; headers are copied except `id` and
    /// `timestamp`, which are regenerated on `build`.
    pub fn from_message(message: &Message<T>) -> Self {
        let mut headers = message.headers.to_map();
        headers.remove(keys::ID);
        headers.remove(keys::TIMESTAMP);
        Self {
            payload: Arc::clone(&message.payload),
            headers,
        }
    }

    /// Set or overwrite a header. `id` and `timestamp` are reserved.
    pub fn set_header(mut self, key: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        let key = key.into();
        if !is_reserved(&key) {
            self.headers.insert(key, value.into());
        }
        self
    }

    /// Set a header only if it is not already present.
    pub fn set_header_if_absent(
        mut self,
        key: impl Into<String>,
        value: impl Into<HeaderValue>,
    ) -> Self {
        let key = key.into();
        if !is_reserved(&key) {
            self.headers.entry(key).or_insert_with(|| value.into());
        }
        self
    }

    /// Remove a header.
    pub fn remove_header(mut self, key: &str) -> Self {
        self.headers.remove(key);
        self
    }

    /// Copy every header from `headers`, overwriting existing ones.
    pub fn copy_headers(mut self, headers: &MessageHeaders) -> Self {
        for (key, value) in headers.iter() {
            if !is_reserved(key) {
                self.headers.insert(key.to_string(), value.clone());
            }
        }
        self
    }

    /// Set the `priority` header.
    pub fn priority(self, priority: i64) -> Self {
        self.set_header(keys::PRIORITY, priority)
    }

    /// Set the `reply-channel` header.
    pub fn reply_channel(self, channel: impl Into<String>) -> Self {
        self.set_header(keys::REPLY_CHANNEL, channel.into())
    }

    /// Set the `correlation-id` header.
    pub fn correlation_id(self, id: impl Into<HeaderValue>) -> Self {
        self.set_header(keys::CORRELATION_ID, id)
    }

    /// Set `sequence-number` and `sequence-size`.
    pub fn sequence(self, number: i64, size: i64) -> Self {
        self.set_header(keys::SEQUENCE_NUMBER, number)
            .set_header(keys::SEQUENCE_SIZE, size)
    }

    /// Finish the message, assigning a fresh `id` and `timestamp`.
    pub fn build(mut self) -> Message<T> {
        self.headers
            .insert(keys::ID.to_string(), HeaderValue::Uuid(Uuid::new_v4()));
        self.headers
            .insert(keys::TIMESTAMP.to_string(), HeaderValue::Int(now_millis()));
        Message {
            payload: self.payload,
            headers: Arc::new(MessageHeaders::from_map(self.headers)),
        }
    }
}

fn is_reserved(key: &str) -> bool {
    key == keys::ID || key == keys::TIMESTAMP
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
