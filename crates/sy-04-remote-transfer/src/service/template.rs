//! Remote file template.
//!
//! Writes message payloads to remote paths over pooled sessions, applying
//! the configured existence policy. Every operation checks a session out of
//! the pool and gives it back when done; sessions that failed at the
//! transport level are discarded instead.

use std::io::Read;

use serde::{Deserialize, Serialize};
use sy_03_session_pool::{CachingSessionFactory, PooledSession, Session, SessionFactory};
use sy_types::Message;
use tracing::{debug, error, warn};

use crate::domain::{paths, FileExistsMode, TransferConfig, TransferPayload};
use crate::error::TransferError;
use crate::metrics::{TransferMetrics, TransferStats};

/// What a send did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransferOutcome {
    Written { path: String },
    Appended { path: String },
    /// Destination existed under IGNORE.
    Skipped { path: String },
}

impl TransferOutcome {
    /// Final remote path.
    pub fn path(&self) -> &str {
        match self {
            TransferOutcome::Written { path }
            | TransferOutcome::Appended { path }
            | TransferOutcome::Skipped { path } => path,
        }
    }

    /// Whether anything reached the remote side.
    pub fn wrote(&self) -> bool {
        !matches!(self, TransferOutcome::Skipped { .. })
    }
}

/// Remote transfer template over a session pool.
pub struct RemoteFileTemplate<F: SessionFactory> {
    pool: CachingSessionFactory<F>,
    config: TransferConfig,
    metrics: TransferMetrics,
}

impl<F: SessionFactory + 'static> RemoteFileTemplate<F> {
    pub fn new(pool: CachingSessionFactory<F>, config: TransferConfig) -> Result<Self, TransferError> {
        config.validate()?;
        Ok(Self {
            pool,
            config,
            metrics: TransferMetrics::new(),
        })
    }

    /// Send using the configured existence policy.
    pub fn send(&self, message: &Message<TransferPayload>) -> Result<TransferOutcome, TransferError> {
        self.send_with_mode(message, self.config.exists_mode)
    }

    /// Send with an explicit existence policy.
    ///
    /// # Errors
    ///
    /// - `TransferError::DestinationExists` under FAIL when the path exists
    /// - `TransferError::Transport` when a session operation fails
    /// - `TransferError::Pool` when no session could be checked out
    /// - `TransferError::Payload` when a file payload cannot be opened
    pub fn send_with_mode(
        &self,
        message: &Message<TransferPayload>,
        mode: FileExistsMode,
    ) -> Result<TransferOutcome, TransferError> {
        let result = self.try_send(message, mode);
        match &result {
            Ok(outcome) => {
                match outcome {
                    TransferOutcome::Written { .. } => self.metrics.record_written(),
                    TransferOutcome::Appended { .. } => self.metrics.record_appended(),
                    TransferOutcome::Skipped { .. } => self.metrics.record_skipped(),
                }
                debug!(
                    message_id = %message.id(),
                    path = outcome.path(),
                    mode = %mode,
                    written = outcome.wrote(),
                    "Remote transfer complete"
                );
            }
            Err(err) => {
                self.metrics.record_failed();
                error!(message_id = %message.id(), mode = %mode, error = %err, "Remote transfer failed");
            }
        }
        result
    }

    fn try_send(
        &self,
        message: &Message<TransferPayload>,
        mode: FileExistsMode,
    ) -> Result<TransferOutcome, TransferError> {
        let directory = self.config.remote_directory.resolve(message.headers())?;
        let file_name = paths::file_name(message)?;
        let path = paths::join(&directory, &file_name, &self.config.remote_path_separator);

        // Open before checkout so a bad payload never ties up a session.
        let mut source = message
            .payload()
            .open()
            .map_err(|source| TransferError::Payload { source })?;

        self.execute(|session| self.write_to(session, &directory, path, &mut source, mode))
    }

    fn write_to(
        &self,
        session: &mut PooledSession<F::Session>,
        directory: &str,
        path: String,
        source: &mut dyn Read,
        mode: FileExistsMode,
    ) -> Result<TransferOutcome, TransferError> {
        if self.config.auto_create_directory && !directory.is_empty() {
            session.mkdir(directory)?;
        }

        if mode.checks_existence() && session.exists(&path)? {
            if mode == FileExistsMode::Fail {
                return Err(TransferError::DestinationExists { path });
            }
            debug!(path = %path, "Destination exists, skipping");
            return Ok(TransferOutcome::Skipped { path });
        }

        if mode == FileExistsMode::Append {
            session.append(source, &path)?;
            return Ok(TransferOutcome::Appended { path });
        }

        if self.config.use_temporary_file_name {
            let temporary = paths::temporary(&path, &self.config.temporary_file_suffix);
            let written = session
                .write(source, &temporary)
                .and_then(|()| session.rename(&temporary, &path));
            if let Err(err) = written {
                Self::remove_temporary(session, &temporary);
                return Err(err.into());
            }
        } else {
            session.write(source, &path)?;
        }
        Ok(TransferOutcome::Written { path })
    }

    /// Best-effort removal of a partial temporary file. Skipped once the
    /// connection itself is gone.
    fn remove_temporary(session: &mut PooledSession<F::Session>, temporary: &str) {
        if !session.is_open() {
            return;
        }
        if let Err(cleanup) = session.remove(temporary) {
            warn!(path = %temporary, error = %cleanup, "Failed to remove temporary file");
        }
    }

    /// Run `op` on a pooled session.
    ///
    /// The session goes back to the pool when `op` returns; forwarded calls
    /// that failed irrecoverably have already marked it for discard.
    pub fn execute<R>(
        &self,
        op: impl FnOnce(&mut PooledSession<F::Session>) -> Result<R, TransferError>,
    ) -> Result<R, TransferError> {
        let mut session = self.pool.acquire()?;
        op(&mut session)
    }

    pub fn exists(&self, path: &str) -> Result<bool, TransferError> {
        self.execute(|session| Ok(session.exists(path)?))
    }

    /// Delete a remote file. `Ok(false)` if it was not there.
    pub fn remove(&self, path: &str) -> Result<bool, TransferError> {
        self.execute(|session| Ok(session.remove(path)?))
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<(), TransferError> {
        self.execute(|session| Ok(session.rename(from, to)?))
    }

    /// Read a remote file into memory.
    pub fn get(&self, path: &str) -> Result<Vec<u8>, TransferError> {
        self.execute(|session| {
            let mut contents = Vec::new();
            session.read(path, &mut contents)?;
            Ok(contents)
        })
    }

    /// Entry names directly under `directory`.
    pub fn list(&self, directory: &str) -> Result<Vec<String>, TransferError> {
        self.execute(|session| Ok(session.list(directory)?))
    }

    pub fn stats(&self) -> TransferStats {
        self.metrics.snapshot()
    }

    pub fn metrics(&self) -> &TransferMetrics {
        &self.metrics
    }

    pub fn pool(&self) -> &CachingSessionFactory<F> {
        &self.pool
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }
}
