//! # Switchyard Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs          # Shared recorders and message helpers
//! │   └── integration/
//! │       ├── flows.rs         # Channel → dispatcher → transfer flows
//! │       └── pool_contention.rs # Blocking acquire, exhaustion, stale sessions
//! └── benches/
//!     └── channel_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sy-tests
//!
//! # By category
//! cargo test -p sy-tests integration::flows
//! cargo test -p sy-tests integration::pool_contention
//!
//! # Benchmarks
//! cargo bench -p sy-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
