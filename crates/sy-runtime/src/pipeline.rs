//! # Delivery Pipeline
//!
//! ```text
//! source dir ──scan──→ PriorityChannel "inbound"
//!                              │
//!                    N blocking workers
//!                              ↓
//!                PublishSubscribeChannel "outbound"
//!                     │                    │
//!                     ↓                    ↓
//!          RemoteFileTemplate         AuditTrail
//!   (pooled LocalFileSession)     (counts and logs)
//! ```
//!
//! Smaller files are delivered first: a message's priority is minus its
//! size in KiB.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sy_01_dispatcher::{DispatcherConfigBuilder, FailurePolicy};
use sy_02_channels::{PriorityChannel, PublishSubscribeChannel};
use sy_03_session_pool::{CachingSessionFactory, PoolStats};
use sy_04_remote_transfer::{
    LocalFileSessionFactory, RemoteFileTemplate, TransferPayload, TransferStats,
};
use sy_types::{
    consumer, handler_fn, HandlerError, Message, MessageBuilder, MessageChannel, PollableChannel,
};
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;

/// Audit subscriber state.
#[derive(Debug, Default)]
pub struct AuditTrail {
    seen: AtomicU64,
}

impl AuditTrail {
    fn record(&self, message: &Message<TransferPayload>) {
        let seen = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        let file = message
            .payload()
            .local_path()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        info!(
            message_id = %message.id(),
            file = %file,
            priority = message.priority().unwrap_or_default(),
            seen,
            "Message audited"
        );
    }

    /// Messages seen so far.
    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct PipelineCounters {
    scanned: AtomicU64,
    published: AtomicU64,
    failed: AtomicU64,
}

/// End-of-run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Files queued by the scanner.
    pub scanned: u64,
    /// Messages published to every subscriber without error.
    pub published: u64,
    /// Files written or appended remotely.
    pub sent: u64,
    /// Files skipped under IGNORE.
    pub skipped: u64,
    /// Messages whose delivery failed.
    pub failed: u64,
    /// Messages still queued when the run stopped.
    pub abandoned: usize,
    pub audited: u64,
    pub pool: PoolStats,
    pub transfer: TransferStats,
}

/// Directory-to-directory delivery pipeline.
pub struct Pipeline {
    config: RuntimeConfig,
    inbound: PriorityChannel<TransferPayload>,
    outbound: PublishSubscribeChannel<TransferPayload>,
    template: Arc<RemoteFileTemplate<LocalFileSessionFactory>>,
    audit: Arc<AuditTrail>,
    counters: PipelineCounters,
    scan_complete: AtomicBool,
    shutdown: AtomicBool,
}

impl Pipeline {
    /// Build channels, pool and subscribers.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;

        let factory = LocalFileSessionFactory::new(config.target_dir.clone()).with_context(|| {
            format!("Failed to open target directory {}", config.target_dir.display())
        })?;
        let pool = CachingSessionFactory::new(factory, config.pool_config())
            .context("Failed to create session pool")?;
        let template = Arc::new(
            RemoteFileTemplate::new(pool, config.transfer_config())
                .context("Failed to create transfer template")?,
        );

        let inbound = PriorityChannel::new(config.channel_config())
            .context("Failed to create inbound channel")?;
        let outbound = PublishSubscribeChannel::new(
            "outbound",
            DispatcherConfigBuilder::new()
                .failure_policy(FailurePolicy::CollectAndContinue)
                .build(),
        );

        let transfer = Arc::clone(&template);
        outbound.subscribe_handler(handler_fn(move |message: &Message<TransferPayload>| {
            transfer
                .send(message)
                .map(|_| None)
                .map_err(|e| HandlerError::with_source("remote transfer failed", e))
        }));

        let audit = Arc::new(AuditTrail::default());
        let trail = Arc::clone(&audit);
        outbound.subscribe_handler(consumer(move |message: &Message<TransferPayload>| {
            trail.record(message)
        }));

        info!(
            source = %config.source_dir.display(),
            target = %config.target_dir.display(),
            workers = config.workers,
            pool_size = config.pool_size,
            exists_mode = %config.exists_mode,
            "Pipeline created"
        );

        Ok(Self {
            config,
            inbound,
            outbound,
            template,
            audit,
            counters: PipelineCounters::default(),
            scan_complete: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Scan the source directory and queue every file, then run the workers
    /// until the inbound channel drains or `shutdown` is called.
    pub async fn run(self: Arc<Self>) -> Result<RunSummary> {
        info!("Pipeline starting");

        let scanner = {
            let pipeline = Arc::clone(&self);
            tokio::task::spawn_blocking(move || pipeline.scan())
        };
        let workers: Vec<_> = (0..self.config.workers)
            .map(|worker| {
                let pipeline = Arc::clone(&self);
                tokio::task::spawn_blocking(move || pipeline.work(worker))
            })
            .collect();

        let scanned = scanner.await.context("Scanner task panicked")?;
        for worker in workers {
            worker.await.context("Worker task panicked")?;
        }
        scanned?;

        let summary = self.summary();
        self.template.pool().close();
        info!(
            scanned = summary.scanned,
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            abandoned = summary.abandoned,
            "Pipeline finished"
        );
        Ok(summary)
    }

    /// Stop scanning and let workers exit after their current message.
    pub fn shutdown(&self) {
        info!("Pipeline shutdown requested");
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Queue every regular file in the source directory, in name order.
    /// Returns the number of files queued.
    pub fn scan(&self) -> Result<u64> {
        let result = source_files(&self.config.source_dir).and_then(|paths| self.enqueue_all(paths));
        self.scan_complete.store(true, Ordering::SeqCst);
        result
    }

    fn enqueue_all(&self, paths: Vec<PathBuf>) -> Result<u64> {
        let mut queued = 0;
        for path in paths {
            if self.is_shutting_down() {
                break;
            }
            let message = file_message(path)?;
            if !self.enqueue(message)? {
                break;
            }
            queued += 1;
            self.counters.scanned.fetch_add(1, Ordering::Relaxed);
        }
        info!(queued, "Source scan complete");
        Ok(queued)
    }

    /// Blocks while the inbound channel is full. `Ok(false)` on shutdown.
    fn enqueue(&self, message: Message<TransferPayload>) -> Result<bool> {
        loop {
            if self
                .inbound
                .send_timeout(message.clone(), Some(self.config.poll_interval))?
            {
                return Ok(true);
            }
            if self.is_shutting_down() {
                return Ok(false);
            }
        }
    }

    /// Drain the inbound channel into the outbound channel. Returns the
    /// number of messages this worker handled.
    pub fn work(&self, worker: usize) -> u64 {
        let mut handled = 0;
        while !self.is_shutting_down() {
            let drained = self.scan_complete.load(Ordering::SeqCst);
            match self.inbound.receive_timeout(Some(self.config.poll_interval)) {
                Some(message) => {
                    handled += 1;
                    self.publish(worker, message);
                }
                None if drained => break,
                None => {}
            }
        }
        debug!(worker, handled, "Worker finished");
        handled
    }

    fn publish(&self, worker: usize, message: Message<TransferPayload>) {
        let message_id = message.id();
        match self.outbound.send(message) {
            Ok(_) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(worker, message_id = %message_id, error = %err, "Delivery failed");
            }
        }
    }

    pub fn summary(&self) -> RunSummary {
        let transfer = self.template.stats();
        RunSummary {
            scanned: self.counters.scanned.load(Ordering::Relaxed),
            published: self.counters.published.load(Ordering::Relaxed),
            sent: transfer.written + transfer.appended,
            skipped: transfer.skipped,
            failed: self.counters.failed.load(Ordering::Relaxed),
            abandoned: self.inbound.queue_size(),
            audited: self.audit.seen(),
            pool: self.template.pool().stats(),
            transfer,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn template(&self) -> &RemoteFileTemplate<LocalFileSessionFactory> {
        &self.template
    }
}

fn source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read source directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn file_message(path: PathBuf) -> Result<Message<TransferPayload>> {
    let size = fs::metadata(&path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    Ok(MessageBuilder::with_payload(TransferPayload::File(path))
        .priority(size_priority(size))
        .build())
}

fn size_priority(size: u64) -> i64 {
    i64::try_from(size / 1024).map_or(i64::MIN, |kib| -kib)
}
