// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, event feed, shutdown.

mod startup;
pub use startup::{startup, startup_with_clock};

use std::fs::File;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use bam_core::Event;
use bam_engine::{ReconcilePolicy, ReportingError, ReportingStream, SchedulerHandle, StreamConfig};
use bam_storage::{Store, StoreError};
use chrono_tz::Tz;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::env;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/bam)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to mutation journal
    pub wal_path: PathBuf,
    /// Path to snapshot file
    pub snapshot_path: PathBuf,
    pub queries_per_transaction: usize,
    pub flush_interval: Duration,
    pub snapshot_interval: Duration,
    /// Zone whose midnights bound reporting days
    pub timezone: Tz,
    pub close_open_on_startup: bool,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let mut config = Self::at(env::state_dir()?);
        config.queries_per_transaction = env::queries_per_transaction();
        config.flush_interval = env::flush_interval();
        config.snapshot_interval = env::snapshot_interval();
        config.timezone = env::timezone()?;
        config.close_open_on_startup = env::close_open_on_startup();
        Ok(config)
    }

    /// Default settings with every file under `state_dir`.
    pub fn at(state_dir: PathBuf) -> Self {
        Self {
            lock_path: state_dir.join("bamd.pid"),
            log_path: state_dir.join("bamd.log"),
            wal_path: state_dir.join("wal").join("reporting.wal"),
            snapshot_path: state_dir.join("snapshot.zst"),
            state_dir,
            queries_per_transaction: StreamConfig::default().queries_per_transaction,
            flush_interval: Duration::from_secs(1),
            snapshot_interval: Duration::from_secs(300),
            timezone: chrono_tz::UTC,
            close_open_on_startup: ReconcilePolicy::default().close_last_open,
        }
    }
}

/// A running daemon.
pub struct Daemon {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub store: Store,
    pub stream: ReportingStream,
    scheduler: SchedulerHandle,
}

impl Daemon {
    /// Feed newline-delimited JSON events from `input` until it ends or
    /// `shutdown` resolves.
    ///
    /// Each acknowledgment is written to `output` as `{"ack":N}`; a rejected
    /// line produces `{"error":"..."}`.
    pub async fn run<R, W>(
        &mut self,
        input: R,
        mut output: W,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), LifecycleError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut flush_tick = interval_at(
            Instant::now() + self.config.flush_interval,
            self.config.flush_interval,
        );
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut snapshot_tick = interval_at(
            Instant::now() + self.config.snapshot_interval,
            self.config.snapshot_interval,
        );
        snapshot_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => self.handle_line(&line, &mut output).await?,
                    None => {
                        info!("input closed");
                        break;
                    }
                },
                _ = flush_tick.tick() => {
                    let result = self.stream.flush();
                    report(result, &mut output).await?;
                }
                _ = snapshot_tick.tick() => self.checkpoint(),
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        let result = self.stream.flush();
        report(result, &mut output).await
    }

    async fn handle_line<W: AsyncWrite + Unpin>(
        &mut self,
        line: &str,
        output: &mut W,
    ) -> Result<(), LifecycleError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        match serde_json::from_str::<Event>(line) {
            Ok(event) => {
                debug!(type_id = event.type_id(), "event received");
                let result = match event {
                    Event::Rebuild(_) => off_reactor(|| self.stream.write(&event)),
                    _ => self.stream.write(&event),
                };
                report(result, output).await
            }
            Err(e) => {
                warn!(error = %e, "unparseable event");
                write_line(output, &serde_json::json!({ "error": format!("invalid event: {e}") })).await
            }
        }
    }

    /// Save a snapshot and trim the journal; failures are logged.
    pub fn checkpoint(&self) {
        if let Err(e) = self.store.checkpoint(&self.config.snapshot_path) {
            warn!(error = %e, "checkpoint failed");
        }
    }

    pub fn status(&self) -> String {
        self.stream.status()
    }

    /// Stop the availability worker, flush, and save a final snapshot.
    pub async fn shutdown(mut self) -> Result<(), LifecycleError> {
        info!("shutting down daemon...");
        if let Err(e) = self.stream.flush() {
            warn!(error = %e, "failed to flush on shutdown");
        }
        self.scheduler.shutdown().await;
        self.store.checkpoint(&self.config.snapshot_path)?;

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("failed to remove PID file: {}", e);
            }
        }
        info!("daemon shutdown complete");
        Ok(())
    }
}

/// Write the outcome of a stream call; acknowledgments of zero are silent.
async fn report<W: AsyncWrite + Unpin>(
    result: Result<usize, ReportingError>,
    output: &mut W,
) -> Result<(), LifecycleError> {
    match result {
        Ok(0) => Ok(()),
        Ok(acked) => write_line(output, &serde_json::json!({ "ack": acked })).await,
        Err(e) => {
            warn!(error = %e, "event rejected");
            write_line(output, &serde_json::json!({ "error": e.to_string() })).await
        }
    }
}

/// Run a long synchronous call without stalling the other tasks of a
/// multi-threaded runtime. Other runtimes run it in place.
fn off_reactor<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => block_in_place(f),
        _ => f(),
    }
}

async fn write_line<W: AsyncWrite + Unpin>(
    output: &mut W,
    value: &serde_json::Value,
) -> Result<(), LifecycleError> {
    let mut line = value.to_string();
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Reporting error: {0}")]
    Reporting(#[from] ReportingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
