//! # SY Telemetry
//!
//! Logging bootstrap shared by Switchyard binaries and tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sy_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&TelemetryConfig::from_env())?;
//!     // Application code; every crate logs through `tracing`
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SY_SERVICE_NAME` | `switchyard` | Service name in the startup line |
//! | `SY_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SY_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `SY_JSON_LOGS` | `false` (`true` in containers) | JSON lines output |

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging, LoggingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}
