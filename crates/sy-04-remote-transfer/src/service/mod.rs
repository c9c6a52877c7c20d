//! Service Layer
//!
//! `RemoteFileTemplate` drives pooled sessions through the transfer
//! algorithm.

pub mod template;

pub use template::{RemoteFileTemplate, TransferOutcome};
