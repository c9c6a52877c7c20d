//! In-memory remote store.
//!
//! Sessions share one map of path → bytes. The factory can disconnect every
//! open session, refuse new connections and inject write failures, which
//! makes it the transport of choice for tests and demos.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sy_03_session_pool::{Session, SessionError, SessionFactory};

#[derive(Debug, Default)]
struct StoreInner {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    writes: u64,
    appends: u64,
    fail_writes: bool,
}

/// Shared remote file tree. Cloning yields another handle to the same tree.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file directly, bypassing sessions and counters.
    pub fn put(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.inner.lock().files.insert(path.to_string(), contents.into());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().files.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.lock().files.contains_key(path)
    }

    /// Every file path, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.inner.lock().files.keys().cloned().collect()
    }

    pub fn has_directory(&self, path: &str) -> bool {
        self.inner.lock().dirs.contains(path.trim_end_matches('/'))
    }

    /// Completed `write` calls.
    pub fn write_count(&self) -> u64 {
        self.inner.lock().writes
    }

    /// Completed `append` calls.
    pub fn append_count(&self) -> u64 {
        self.inner.lock().appends
    }

    /// Make every subsequent `write` and `append` fail with a connection error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }
}

/// Opens sessions on an `InMemoryStore`.
#[derive(Debug)]
pub struct InMemorySessionFactory {
    store: InMemoryStore,
    append_supported: bool,
    refuse: AtomicBool,
    created: AtomicU64,
    live: Mutex<Vec<Arc<AtomicBool>>>,
}

impl InMemorySessionFactory {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            append_supported: true,
            refuse: AtomicBool::new(false),
            created: AtomicU64::new(0),
            live: Mutex::new(Vec::new()),
        }
    }

    /// Sessions from this factory reject `append` as unsupported.
    pub fn without_append(mut self) -> Self {
        self.append_supported = false;
        self
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn sessions_created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    /// Drop the connection of every session opened so far.
    pub fn disconnect_all(&self) {
        let mut live = self.live.lock();
        for open in live.iter() {
            open.store(false, Ordering::SeqCst);
        }
        live.clear();
    }

    /// Make `create` fail until called again with `false`.
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

impl SessionFactory for InMemorySessionFactory {
    type Session = InMemorySession;

    fn create(&self) -> Result<InMemorySession, SessionError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SessionError::Connection("connection refused".to_string()));
        }
        let id = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let open = Arc::new(AtomicBool::new(true));
        self.live.lock().push(Arc::clone(&open));
        Ok(InMemorySession {
            id,
            store: self.store.clone(),
            open,
            append_supported: self.append_supported,
        })
    }
}

/// One connection to an `InMemoryStore`.
#[derive(Debug)]
pub struct InMemorySession {
    id: u64,
    store: InMemoryStore,
    open: Arc<AtomicBool>,
    append_supported: bool,
}

impl InMemorySession {
    /// Sequence number of this connection within its factory.
    pub fn id(&self) -> u64 {
        self.id
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SessionError::Connection(format!(
                "session {} is disconnected",
                self.id
            )))
        }
    }

    fn read_source(source: &mut dyn Read, path: &str) -> Result<Vec<u8>, SessionError> {
        let mut buf = Vec::new();
        source
            .read_to_end(&mut buf)
            .map_err(|e| SessionError::io(path, e))?;
        Ok(buf)
    }
}

impl Session for InMemorySession {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn write(&mut self, source: &mut dyn Read, path: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let contents = Self::read_source(source, path)?;
        let mut inner = self.store.inner.lock();
        if inner.fail_writes {
            return Err(SessionError::Connection("injected write failure".to_string()));
        }
        inner.files.insert(path.to_string(), contents);
        inner.writes += 1;
        Ok(())
    }

    fn append(&mut self, source: &mut dyn Read, path: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        if !self.append_supported {
            return Err(SessionError::Unsupported("append"));
        }
        let contents = Self::read_source(source, path)?;
        let mut inner = self.store.inner.lock();
        if inner.fail_writes {
            return Err(SessionError::Connection("injected write failure".to_string()));
        }
        inner
            .files
            .entry(path.to_string())
            .or_default()
            .extend_from_slice(&contents);
        inner.appends += 1;
        Ok(())
    }

    fn exists(&mut self, path: &str) -> Result<bool, SessionError> {
        self.ensure_open()?;
        let inner = self.store.inner.lock();
        Ok(inner.files.contains_key(path) || inner.dirs.contains(path.trim_end_matches('/')))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let mut inner = self.store.inner.lock();
        let contents = inner
            .files
            .remove(from)
            .ok_or_else(|| SessionError::NotFound(from.to_string()))?;
        inner.files.insert(to.to_string(), contents);
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<bool, SessionError> {
        self.ensure_open()?;
        Ok(self.store.inner.lock().files.remove(path).is_some())
    }

    fn mkdir(&mut self, path: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let mut inner = self.store.inner.lock();
        let trimmed = path.trim_end_matches('/');
        for (i, c) in trimmed.char_indices() {
            if c == '/' && i > 0 {
                inner.dirs.insert(trimmed[..i].to_string());
            }
        }
        if !trimmed.is_empty() {
            inner.dirs.insert(trimmed.to_string());
        }
        Ok(())
    }

    fn read(&mut self, path: &str, sink: &mut dyn Write) -> Result<(), SessionError> {
        self.ensure_open()?;
        let contents = self
            .store
            .file(path)
            .ok_or_else(|| SessionError::NotFound(path.to_string()))?;
        sink.write_all(&contents)
            .map_err(|e| SessionError::io(path, e))
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, SessionError> {
        self.ensure_open()?;
        let inner = self.store.inner.lock();
        let names: BTreeSet<String> = inner
            .files
            .keys()
            .chain(inner.dirs.iter())
            .filter_map(|entry| child_name(path, entry))
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }
}

/// Name of `entry` if it sits directly under `directory`.
fn child_name<'a>(directory: &str, entry: &'a str) -> Option<&'a str> {
    let directory = directory.trim_end_matches('/');
    let rest = if directory.is_empty() {
        entry.trim_start_matches('/')
    } else {
        entry.strip_prefix(directory)?.strip_prefix('/')?
    };
    if rest.is_empty() || rest.contains('/') {
        None
    } else {
        Some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (InMemorySessionFactory, InMemorySession) {
        let factory = InMemorySessionFactory::new(InMemoryStore::new());
        let session = factory.create().unwrap();
        (factory, session)
    }

    #[test]
    fn test_write_read_round_trip() {
        let (factory, mut session) = session();
        session.write(&mut &b"hello"[..], "/out/a.txt").unwrap();

        let mut buf = Vec::new();
        session.read("/out/a.txt", &mut buf).unwrap();
        assert_eq!(buf, b"hello");
        assert_eq!(factory.store().write_count(), 1);
    }

    #[test]
    fn test_append_creates_then_extends() {
        let (factory, mut session) = session();
        session.append(&mut &b"ab"[..], "log").unwrap();
        session.append(&mut &b"cd"[..], "log").unwrap();
        assert_eq!(factory.store().file("log").unwrap(), b"abcd");
        assert_eq!(factory.store().append_count(), 2);
    }

    #[test]
    fn test_append_unsupported() {
        let factory = InMemorySessionFactory::new(InMemoryStore::new()).without_append();
        let mut session = factory.create().unwrap();
        let err = session.append(&mut &b"x"[..], "log").unwrap_err();
        assert!(matches!(err, SessionError::Unsupported("append")));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_rename_replaces_target() {
        let (factory, mut session) = session();
        factory.store().put("a", "new");
        factory.store().put("b", "old");

        session.rename("a", "b").unwrap();
        assert_eq!(factory.store().file("b").unwrap(), b"new");
        assert!(!factory.store().contains("a"));
        assert!(matches!(
            session.rename("a", "c"),
            Err(SessionError::NotFound(_))
        ));
    }

    #[test]
    fn test_disconnect_breaks_open_sessions() {
        let (factory, mut session) = session();
        factory.disconnect_all();

        assert!(!session.is_open());
        let err = session.exists("x").unwrap_err();
        assert!(!err.is_recoverable());

        let mut fresh = factory.create().unwrap();
        assert!(fresh.exists("x").is_ok());
        assert_eq!(fresh.id(), 2);
    }

    #[test]
    fn test_refused_connections() {
        let factory = InMemorySessionFactory::new(InMemoryStore::new());
        factory.refuse_connections(true);
        assert!(factory.create().is_err());
        factory.refuse_connections(false);
        assert!(factory.create().is_ok());
    }

    #[test]
    fn test_mkdir_and_list() {
        let (factory, mut session) = session();
        session.mkdir("/out/archive/").unwrap();
        factory.store().put("/out/a.txt", "a");
        factory.store().put("/out/b.txt", "b");
        factory.store().put("/out/archive/old.txt", "o");

        assert!(factory.store().has_directory("/out"));
        assert!(session.exists("/out/archive").unwrap());
        assert_eq!(
            session.list("/out").unwrap(),
            vec!["a.txt".to_string(), "archive".to_string(), "b.txt".to_string()]
        );
        assert_eq!(session.list("/").unwrap(), vec!["out".to_string()]);
    }

    #[test]
    fn test_injected_write_failure_is_irrecoverable() {
        let (factory, mut session) = session();
        factory.store().fail_writes(true);
        let err = session.write(&mut &b"x"[..], "a").unwrap_err();
        assert!(!err.is_recoverable());
        assert!(!factory.store().contains("a"));
    }
}
