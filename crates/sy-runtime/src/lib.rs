//! # Switchyard Runtime Library
//!
//! Exposes the pipeline wiring for tests. The entry point is the
//! `sy-runtime` binary in `main.rs`.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`sy-telemetry`)
//! 2. Load `RuntimeConfig` from the environment
//! 3. Build channels, session pool and subscribers
//! 4. Scan the source directory and run the workers
//! 5. Report a `RunSummary` on drain or Ctrl+C

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod pipeline;

pub use config::{RuntimeConfig, RuntimeConfigError};
pub use pipeline::{AuditTrail, Pipeline, RunSummary};
