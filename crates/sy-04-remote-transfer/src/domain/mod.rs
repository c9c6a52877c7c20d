//! Domain Layer
//!
//! Existence policies, payloads, configuration and path rules. No I/O
//! beyond opening local payload files.

pub mod config;
pub mod mode;
pub mod paths;
pub mod payload;

pub use config::{
    RemoteDirectory, TransferConfig, TransferConfigBuilder, DEFAULT_SEPARATOR,
    DEFAULT_TEMPORARY_SUFFIX,
};
pub use mode::FileExistsMode;
pub use payload::TransferPayload;
