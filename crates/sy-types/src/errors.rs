//! # Error Types
//!
//! Defines error types shared by every subsystem that touches messages.

use thiserror::Error;

/// Boxed error used where a port must carry a failure from another crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised when reading a header as a concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The header exists but holds a value of another type.
    #[error("Header '{key}' holds a {actual} value, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors surfaced by `MessageChannel::send_timeout`.
///
/// A full bounded channel is NOT an error: it is reported as `Ok(false)`.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The message carries a header the channel cannot interpret.
    #[error("Channel '{channel}' rejected message: {source}")]
    Header {
        channel: String,
        #[source]
        source: HeaderError,
    },

    /// Delivery to one or more subscribers failed.
    #[error("Delivery on channel '{channel}' failed: {source}")]
    Delivery {
        channel: String,
        #[source]
        source: BoxError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message_names_key() {
        let err = HeaderError::TypeMismatch {
            key: "priority".to_string(),
            expected: "integer",
            actual: "text",
        };
        assert_eq!(
            err.to_string(),
            "Header 'priority' holds a text value, expected integer"
        );
    }

    #[test]
    fn test_channel_error_keeps_source() {
        use std::error::Error as _;

        let err = ChannelError::Header {
            channel: "inbound".to_string(),
            source: HeaderError::TypeMismatch {
                key: "priority".to_string(),
                expected: "integer",
                actual: "bool",
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("inbound"));
    }
}
