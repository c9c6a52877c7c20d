//! Ports Layer
//!
//! - `Session`: driven port for one remote connection
//! - `SessionFactory`: driven port that opens connections

pub mod session;

pub use session::{Session, SessionError, SessionFactory};
