//! Driven ports: the remote session and the factory that opens it.
//!
//! Adapters (in-memory, local filesystem, a real file-transfer client)
//! implement these; the pool and the transfer template only call them.

use std::io::{Read, Write};

use thiserror::Error;

/// Errors raised by a session or its factory.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session is closed")]
    Closed,

    #[error("Remote path not found: {0}")]
    NotFound(String),

    #[error("Operation not supported by this session: {0}")]
    Unsupported(&'static str),

    #[error("Connection failure: {0}")]
    Connection(String),

    #[error("Invalid remote path: {0}")]
    InvalidPath(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Whether the session is still usable after this error.
    ///
    /// Irrecoverable errors leave the connection in an unknown state; a
    /// pooled handle that saw one is discarded instead of reused.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::NotFound(_) | SessionError::Unsupported(_) | SessionError::InvalidPath(_)
        )
    }

    /// Wrap an I/O error for `path`.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        SessionError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A live connection to a remote store.
///
/// Paths are remote paths in the store's own syntax.
pub trait Session: Send {
    /// Liveness probe. Must be cheap and must not fail.
    fn is_open(&self) -> bool;

    /// Close the connection.
    fn close(&mut self) -> Result<(), SessionError>;

    /// Create or overwrite `path` with the contents of `source`.
    fn write(&mut self, source: &mut dyn Read, path: &str) -> Result<(), SessionError>;

    /// Append `source` to `path`, creating it if absent.
    fn append(&mut self, source: &mut dyn Read, path: &str) -> Result<(), SessionError>;

    fn exists(&mut self, path: &str) -> Result<bool, SessionError>;

    /// Rename `from` to `to`, replacing `to` if it exists.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), SessionError>;

    /// Remove `path`. Returns `false` if it did not exist.
    fn remove(&mut self, path: &str) -> Result<bool, SessionError>;

    /// Create a directory and any missing parents.
    fn mkdir(&mut self, path: &str) -> Result<(), SessionError>;

    /// Stream the contents of `path` into `sink`.
    fn read(&mut self, path: &str, sink: &mut dyn Write) -> Result<(), SessionError>;

    /// Names of the entries directly under `path`, sorted.
    fn list(&mut self, path: &str) -> Result<Vec<String>, SessionError>;
}

/// Opens new sessions.
pub trait SessionFactory: Send + Sync {
    type Session: Session + 'static;

    fn create(&self) -> Result<Self::Session, SessionError>;
}
