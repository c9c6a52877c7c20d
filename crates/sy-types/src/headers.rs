//! # Message Headers
//!
//! Headers are a case-sensitive map from name to a dynamically typed
//! `HeaderValue`. Reads go through `FromHeaderValue`, which refuses to coerce
//! between unrelated types. The only widening allowed is integer to float.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::HeaderError;

/// Well-known header names.
pub mod keys {
    /// Unique message identifier, assigned on build.
    pub const ID: &str = "id";
    /// Creation time in unix milliseconds, assigned on build.
    pub const TIMESTAMP: &str = "timestamp";
    /// Delivery priority for priority channels (higher first).
    pub const PRIORITY: &str = "priority";
    /// Name of the channel replies should be sent to.
    pub const REPLY_CHANNEL: &str = "reply-channel";
    /// Name of the channel failures should be reported to.
    pub const ERROR_CHANNEL: &str = "error-channel";
    /// Identifier shared by messages derived from the same original.
    pub const CORRELATION_ID: &str = "correlation-id";
    /// 1-based position of a message within its sequence.
    pub const SEQUENCE_NUMBER: &str = "sequence-number";
    /// Number of messages in the sequence.
    pub const SEQUENCE_SIZE: &str = "sequence-size";
    /// Remote file name used by transfer templates.
    pub const FILE_NAME: &str = "file-name";
}

/// A dynamically typed header value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum HeaderValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
}

impl HeaderValue {
    /// Human-readable name of the stored type, used in mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            HeaderValue::Bool(_) => "bool",
            HeaderValue::Int(_) => "integer",
            HeaderValue::Float(_) => "float",
            HeaderValue::Text(_) => "text",
            HeaderValue::Bytes(_) => "bytes",
            HeaderValue::Uuid(_) => "uuid",
        }
    }

    /// Borrow the value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Bool(v) => write!(f, "{v}"),
            HeaderValue::Int(v) => write!(f, "{v}"),
            HeaderValue::Float(v) => write!(f, "{v}"),
            HeaderValue::Text(v) => f.write_str(v),
            HeaderValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            HeaderValue::Uuid(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for HeaderValue {
    fn from(v: bool) -> Self {
        HeaderValue::Bool(v)
    }
}

impl From<i64> for HeaderValue {
    fn from(v: i64) -> Self {
        HeaderValue::Int(v)
    }
}

impl From<i32> for HeaderValue {
    fn from(v: i32) -> Self {
        HeaderValue::Int(i64::from(v))
    }
}

impl From<u32> for HeaderValue {
    fn from(v: u32) -> Self {
        HeaderValue::Int(i64::from(v))
    }
}

impl From<f64> for HeaderValue {
    fn from(v: f64) -> Self {
        HeaderValue::Float(v)
    }
}

impl From<String> for HeaderValue {
    fn from(v: String) -> Self {
        HeaderValue::Text(v)
    }
}

impl From<&str> for HeaderValue {
    fn from(v: &str) -> Self {
        HeaderValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(v: Vec<u8>) -> Self {
        HeaderValue::Bytes(v)
    }
}

impl From<Uuid> for HeaderValue {
    fn from(v: Uuid) -> Self {
        HeaderValue::Uuid(v)
    }
}

/// Conversion from a stored header value into a concrete type.
pub trait FromHeaderValue: Sized {
    /// Type name reported in `HeaderError::TypeMismatch`.
    const TYPE_NAME: &'static str;

    /// Returns `None` when the value cannot be represented as `Self`.
    fn from_header(value: &HeaderValue) -> Option<Self>;
}

impl FromHeaderValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_header(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromHeaderValue for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_header(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromHeaderValue for f64 {
    const TYPE_NAME: &'static str = "float";

    #[allow(clippy::cast_precision_loss)]
    fn from_header(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromHeaderValue for String {
    const TYPE_NAME: &'static str = "text";

    fn from_header(value: &HeaderValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromHeaderValue for Vec<u8> {
    const TYPE_NAME: &'static str = "bytes";

    fn from_header(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Bytes(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromHeaderValue for Uuid {
    const TYPE_NAME: &'static str = "uuid";

    fn from_header(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::Uuid(v) => Some(*v),
            _ => None,
        }
    }
}

/// Immutable header map of a message.
///
/// Iteration is ordered by key so snapshots and logs are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHeaders {
    entries: BTreeMap<String, HeaderValue>,
}

impl MessageHeaders {
    pub(crate) fn from_map(entries: BTreeMap<String, HeaderValue>) -> Self {
        Self { entries }
    }

    pub(crate) fn to_map(&self) -> BTreeMap<String, HeaderValue> {
        self.entries.clone()
    }

    /// Raw access to a header value.
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries.get(key)
    }

    /// Typed access to a header value.
    ///
    /// - `Ok(None)` - header absent
    /// - `Ok(Some(v))` - header present and convertible
    /// - `Err(TypeMismatch)` - header present with another type
    pub fn get_as<T: FromHeaderValue>(&self, key: &str) -> Result<Option<T>, HeaderError> {
        let Some(value) = self.entries.get(key) else {
            return Ok(None);
        };
        T::from_header(value)
            .map(Some)
            .ok_or_else(|| HeaderError::TypeMismatch {
                key: key.to_string(),
                expected: T::TYPE_NAME,
                actual: value.type_name(),
            })
    }

    /// Whether the header is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no headers at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over headers ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Message id, assigned by `MessageBuilder::build`.
    pub fn id(&self) -> Option<Uuid> {
        self.get_as(keys::ID).ok().flatten()
    }

    /// Creation timestamp in unix milliseconds.
    pub fn timestamp(&self) -> Option<i64> {
        self.get_as(keys::TIMESTAMP).ok().flatten()
    }

    /// Priority header, if set.
    pub fn priority(&self) -> Result<Option<i64>, HeaderError> {
        self.get_as(keys::PRIORITY)
    }

    /// Reply channel name, if set.
    pub fn reply_channel(&self) -> Result<Option<&str>, HeaderError> {
        self.text(keys::REPLY_CHANNEL)
    }

    /// Error channel name, if set.
    pub fn error_channel(&self) -> Result<Option<&str>, HeaderError> {
        self.text(keys::ERROR_CHANNEL)
    }

    /// Correlation id in whatever form the producer stored it.
    pub fn correlation_id(&self) -> Option<&HeaderValue> {
        self.entries.get(keys::CORRELATION_ID)
    }

    /// 1-based sequence number, if set.
    pub fn sequence_number(&self) -> Result<Option<i64>, HeaderError> {
        self.get_as(keys::SEQUENCE_NUMBER)
    }

    /// Sequence size, if set.
    pub fn sequence_size(&self) -> Result<Option<i64>, HeaderError> {
        self.get_as(keys::SEQUENCE_SIZE)
    }

    fn text(&self, key: &str) -> Result<Option<&str>, HeaderError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(HeaderValue::Text(s)) => Ok(Some(s)),
            Some(other) => Err(HeaderError::TypeMismatch {
                key: key.to_string(),
                expected: "text",
                actual: other.type_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, HeaderValue)]) -> MessageHeaders {
        MessageHeaders::from_map(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_get_as_absent_is_none() {
        let h = MessageHeaders::default();
        assert_eq!(h.get_as::<i64>("priority"), Ok(None));
    }

    #[test]
    fn test_get_as_matching_type() {
        let h = headers(&[("priority", HeaderValue::Int(7))]);
        assert_eq!(h.get_as::<i64>("priority"), Ok(Some(7)));
        assert_eq!(h.priority(), Ok(Some(7)));
    }

    #[test]
    fn test_get_as_mismatch_reports_both_types() {
        let h = headers(&[("priority", HeaderValue::Text("high".into()))]);
        let err = h.get_as::<i64>("priority").unwrap_err();
        assert_eq!(
            err,
            HeaderError::TypeMismatch {
                key: "priority".into(),
                expected: "integer",
                actual: "text",
            }
        );
    }

    #[test]
    fn test_integer_widens_to_float_only() {
        let h = headers(&[("ratio", HeaderValue::Int(3))]);
        assert_eq!(h.get_as::<f64>("ratio"), Ok(Some(3.0)));
        assert!(h.get_as::<String>("ratio").is_err());
        assert!(h.get_as::<bool>("ratio").is_err());
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let h = headers(&[("Priority", HeaderValue::Int(1))]);
        assert!(h.contains("Priority"));
        assert!(!h.contains("priority"));
        assert_eq!(h.priority(), Ok(None));
    }

    #[test]
    fn test_reply_channel_must_be_text() {
        let h = headers(&[(keys::REPLY_CHANNEL, HeaderValue::Int(4))]);
        assert!(h.reply_channel().is_err());

        let h = headers(&[(keys::REPLY_CHANNEL, HeaderValue::from("replies"))]);
        assert_eq!(h.reply_channel(), Ok(Some("replies")));
    }

    #[test]
    fn test_iteration_is_sorted_by_key() {
        let h = headers(&[
            ("zeta", HeaderValue::Bool(true)),
            ("alpha", HeaderValue::Int(1)),
            ("mid", HeaderValue::from("x")),
        ]);
        let keys: Vec<&str> = h.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_headers_serialize_as_tagged_values() {
        let h = headers(&[("priority", HeaderValue::Int(5))]);
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["priority"]["type"], "int");
        assert_eq!(json["priority"]["value"], 5);

        let back: MessageHeaders = serde_json::from_value(json).unwrap();
        assert_eq!(back, h);
    }
}
