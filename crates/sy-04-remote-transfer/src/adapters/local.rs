//! Local filesystem "remote" rooted at a directory.
//!
//! Remote paths are resolved relative to the root; absolute paths are
//! re-rooted and `..` components are rejected.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use sy_03_session_pool::{Session, SessionError, SessionFactory};

/// Opens sessions on a local directory tree.
#[derive(Debug)]
pub struct LocalFileSessionFactory {
    root: PathBuf,
    created: AtomicU64,
}

impl LocalFileSessionFactory {
    /// Serve `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| SessionError::io(root.display().to_string(), e))?;
        Ok(Self {
            root,
            created: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sessions_created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }
}

impl SessionFactory for LocalFileSessionFactory {
    type Session = LocalFileSession;

    fn create(&self) -> Result<LocalFileSession, SessionError> {
        if !self.root.is_dir() {
            return Err(SessionError::Connection(format!(
                "root directory {} is not available",
                self.root.display()
            )));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(LocalFileSession {
            root: self.root.clone(),
            open: true,
        })
    }
}

/// Session over a local directory.
#[derive(Debug)]
pub struct LocalFileSession {
    root: PathBuf,
    open: bool,
}

impl LocalFileSession {
    fn resolve(&self, path: &str) -> Result<PathBuf, SessionError> {
        if !self.open {
            return Err(SessionError::Closed);
        }
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(SessionError::InvalidPath(path.to_string()))
                }
            }
        }
        Ok(resolved)
    }
}

fn map_io(path: &str, err: io::Error) -> SessionError {
    if err.kind() == io::ErrorKind::NotFound {
        SessionError::NotFound(path.to_string())
    } else {
        SessionError::io(path, err)
    }
}

impl Session for LocalFileSession {
    fn is_open(&self) -> bool {
        self.open && self.root.is_dir()
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.open = false;
        Ok(())
    }

    fn write(&mut self, source: &mut dyn Read, path: &str) -> Result<(), SessionError> {
        let target = self.resolve(path)?;
        let mut file = File::create(&target).map_err(|e| map_io(path, e))?;
        io::copy(source, &mut file).map_err(|e| SessionError::io(path, e))?;
        file.flush().map_err(|e| SessionError::io(path, e))
    }

    fn append(&mut self, source: &mut dyn Read, path: &str) -> Result<(), SessionError> {
        let target = self.resolve(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target)
            .map_err(|e| map_io(path, e))?;
        io::copy(source, &mut file).map_err(|e| SessionError::io(path, e))?;
        file.flush().map_err(|e| SessionError::io(path, e))
    }

    fn exists(&mut self, path: &str) -> Result<bool, SessionError> {
        let target = self.resolve(path)?;
        target.try_exists().map_err(|e| SessionError::io(path, e))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), SessionError> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        fs::rename(&source, &target).map_err(|e| map_io(from, e))
    }

    fn remove(&mut self, path: &str) -> Result<bool, SessionError> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SessionError::io(path, e)),
        }
    }

    fn mkdir(&mut self, path: &str) -> Result<(), SessionError> {
        let target = self.resolve(path)?;
        fs::create_dir_all(&target).map_err(|e| SessionError::io(path, e))
    }

    fn read(&mut self, path: &str, sink: &mut dyn Write) -> Result<(), SessionError> {
        let target = self.resolve(path)?;
        let mut file = File::open(&target).map_err(|e| map_io(path, e))?;
        io::copy(&mut file, sink)
            .map(|_| ())
            .map_err(|e| SessionError::io(path, e))
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, SessionError> {
        let target = self.resolve(path)?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&target).map_err(|e| map_io(path, e))? {
            let entry = entry.map_err(|e| SessionError::io(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
