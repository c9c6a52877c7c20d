//! Pooled session handle.
//!
//! Forwards every `Session` call to the underlying session. `close()` and
//! `Drop` give the session back to the pool instead of closing it.

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::domain::{EntryState, PoolEntry};
use crate::ports::{Session, SessionError};

/// Where a handle returns its session.
pub(crate) trait EntrySink<S>: Send + Sync {
    fn give_back(&self, entry: PoolEntry, session: S, dirty: bool) -> EntryState;
}

/// A session checked out of a `CachingSessionFactory`.
///
/// Single owner: the handle is `Send` but not shared between threads.
pub struct PooledSession<S> {
    entry: PoolEntry,
    session: Option<S>,
    dirty: bool,
    sink: Arc<dyn EntrySink<S>>,
}

impl<S: Session> PooledSession<S> {
    pub(crate) fn new(entry: PoolEntry, session: S, sink: Arc<dyn EntrySink<S>>) -> Self {
        Self {
            entry,
            session: Some(session),
            dirty: false,
            sink,
        }
    }

    /// Identity of the underlying session, stable across acquire/release
    /// cycles.
    pub fn session_id(&self) -> u64 {
        self.entry.id()
    }

    pub fn entry(&self) -> &PoolEntry {
        &self.entry
    }

    /// Whether release will discard the session.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Close the session on release instead of returning it to the pool.
    pub fn discard(&mut self) {
        self.dirty = true;
    }

    /// Give the session back now and report what the pool did with it.
    pub fn release(mut self) -> EntryState {
        self.give_back().unwrap_or(EntryState::Discarded)
    }

    fn give_back(&mut self) -> Option<EntryState> {
        let session = self.session.take()?;
        Some(self.sink.give_back(self.entry, session, self.dirty))
    }

    fn forward<R>(
        &mut self,
        op: impl FnOnce(&mut S) -> Result<R, SessionError>,
    ) -> Result<R, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::Closed)?;
        let result = op(session);
        if let Err(err) = &result {
            if !err.is_recoverable() {
                self.dirty = true;
            }
        }
        result
    }
}

impl<S: Session> Session for PooledSession<S> {
    fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_open)
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.give_back();
        Ok(())
    }

    fn write(&mut self, source: &mut dyn Read, path: &str) -> Result<(), SessionError> {
        self.forward(|s| s.write(source, path))
    }

    fn append(&mut self, source: &mut dyn Read, path: &str) -> Result<(), SessionError> {
        self.forward(|s| s.append(source, path))
    }

    fn exists(&mut self, path: &str) -> Result<bool, SessionError> {
        self.forward(|s| s.exists(path))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), SessionError> {
        self.forward(|s| s.rename(from, to))
    }

    fn remove(&mut self, path: &str) -> Result<bool, SessionError> {
        self.forward(|s| s.remove(path))
    }

    fn mkdir(&mut self, path: &str) -> Result<(), SessionError> {
        self.forward(|s| s.mkdir(path))
    }

    fn read(&mut self, path: &str, sink: &mut dyn Write) -> Result<(), SessionError> {
        self.forward(|s| s.read(path, sink))
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, SessionError> {
        self.forward(|s| s.list(path))
    }
}

impl<S> Drop for PooledSession<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.sink.give_back(self.entry, session, self.dirty);
        }
    }
}

impl<S> fmt::Debug for PooledSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledSession")
            .field("entry", &self.entry)
            .field("released", &self.session.is_none())
            .field("dirty", &self.dirty)
            .finish()
    }
}
