// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;

use bam_core::{Clock, SystemClock};
use bam_engine::{
    AvailabilityRequests, AvailabilityScheduler, CalendarCache, ReconcilePolicy, ReportingStream,
    SchedulerConfig, StatusHandle, StreamConfig,
};
use bam_storage::Store;
use fs2::FileExt;
use tracing::info;

use super::{Config, Daemon, LifecycleError};

/// Start the daemon
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    startup_with_clock(config, SystemClock).await
}

/// Start the daemon reading wall-clock time from `clock`.
///
/// Recovery order: tables from snapshot + journal, calendar cache from the
/// stored dimensions, then reconciliation of open events, and only then
/// the availability worker.
pub async fn startup_with_clock<C: Clock>(config: &Config, clock: C) -> Result<Daemon, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents two daemons sharing one journal.
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file (truncate now that we hold the lock)
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file; // Drop mutability

    // 3. Recover tables
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Store::open(&config.wal_path, &config.snapshot_path)?;

    // 4. Calendar cache, then reconciliation against it
    let cache = CalendarCache::default();
    let status = StatusHandle::default();
    let (requests, rx) = AvailabilityRequests::channel();
    let mut stream = ReportingStream::new(
        store.clone(),
        cache.clone(),
        status.clone(),
        requests.clone(),
        StreamConfig::default().queries_per_transaction(config.queries_per_transaction),
    );
    stream.reload_cache();
    let policy = ReconcilePolicy { close_last_open: config.close_open_on_startup };
    let closed = stream.reconcile(policy, clock.epoch_secs())?;

    // 5. Availability worker
    let scheduler = AvailabilityScheduler::new(
        store.clone(),
        cache,
        status,
        SchedulerConfig { timezone: config.timezone },
        clock,
    )
    .spawn(requests, rx);

    info!(
        state_dir = %config.state_dir.display(),
        timezone = config.timezone.name(),
        reconciled = closed,
        "daemon started"
    );

    Ok(Daemon { config: config.clone(), lock_file, store, stream, scheduler })
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
