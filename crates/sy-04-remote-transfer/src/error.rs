//! Error types for remote transfers

use sy_03_session_pool::{PoolError, SessionError};
use sy_types::HeaderError;
use thiserror::Error;

/// Errors that can occur while transferring a message to a remote store
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Remote file already exists: {path}")]
    DestinationExists { path: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] SessionError),

    #[error("Session pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Failed to read payload: {source}")]
    Payload {
        #[source]
        source: std::io::Error,
    },

    #[error("No remote directory: header '{header}' is missing and no fallback is configured")]
    MissingRemoteDirectory { header: String },

    #[error("Invalid header: {0}")]
    Header(#[from] HeaderError),

    #[error("Invalid transfer configuration: {0}")]
    InvalidConfig(String),
}
