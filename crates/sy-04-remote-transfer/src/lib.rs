//! # SY-04 Remote Transfer
//!
//! Writes message payloads to remote file stores over pooled sessions.
//!
//! ## Existence Policies
//!
//! | Mode | Destination exists | Destination absent |
//! |------|--------------------|--------------------|
//! | `REPLACE` | overwrite | write |
//! | `APPEND` | append | create |
//! | `FAIL` | `DestinationExists`, nothing written | write |
//! | `IGNORE` | skip, success | write |
//!
//! Writes other than APPEND go to `<path><suffix>` first and are renamed
//! into place, so readers never observe a partial file.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): policies, payloads, `TransferConfig`, path rules
//! - **Adapters** (`adapters/`): in-memory and local filesystem stores
//! - **Service** (`service/`): `RemoteFileTemplate`
//!
//! ## Usage Example
//!
//! ```ignore
//! use sy_03_session_pool::{CachingSessionFactory, PoolConfig};
//! use sy_04_remote_transfer::{LocalFileSessionFactory, RemoteFileTemplate, TransferConfig};
//!
//! let pool = CachingSessionFactory::new(LocalFileSessionFactory::new("/srv/out")?, PoolConfig::default())?;
//! let template = RemoteFileTemplate::new(pool, TransferConfig::default())?;
//! let outcome = template.send(&message)?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod service;

pub use adapters::{
    InMemorySession, InMemorySessionFactory, InMemoryStore, LocalFileSession,
    LocalFileSessionFactory,
};
pub use domain::{
    FileExistsMode, RemoteDirectory, TransferConfig, TransferConfigBuilder, TransferPayload,
    DEFAULT_SEPARATOR, DEFAULT_TEMPORARY_SUFFIX,
};
pub use error::TransferError;
pub use metrics::{TransferMetrics, TransferStats};
pub use service::{RemoteFileTemplate, TransferOutcome};
