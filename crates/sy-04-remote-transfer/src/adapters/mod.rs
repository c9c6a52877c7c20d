//! Adapters Layer
//!
//! `SessionFactory` implementations for concrete remote stores.

pub mod local;
pub mod memory;

pub use local::{LocalFileSession, LocalFileSessionFactory};
pub use memory::{InMemorySession, InMemorySessionFactory, InMemoryStore};
