// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use bam_core::time::parse_timezone;
use chrono_tz::Tz;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: BAM_STATE_DIR > XDG_STATE_HOME/bam > ~/.local/state/bam
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("BAM_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("bam"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/bam"))
}

/// Mutations per ingest transaction (default 1000; below 2 commits every event)
pub fn queries_per_transaction() -> usize {
    std::env::var("BAM_QUERIES_PER_TRANSACTION")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1000)
}

/// Periodic flush of the ingest transaction
pub fn flush_interval() -> Duration {
    std::env::var("BAM_FLUSH_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(1))
}

/// Zone whose midnights bound reporting days (default UTC).
pub fn timezone() -> Result<Tz, LifecycleError> {
    let name = std::env::var("BAM_TIMEZONE").unwrap_or_default();
    parse_timezone(&name).map_err(|e| LifecycleError::Config(e.to_string()))
}

/// Whether startup force-closes the last open event of each BA/KPI.
pub fn close_open_on_startup() -> bool {
    match std::env::var("BAM_CLOSE_OPEN_ON_STARTUP") {
        Ok(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"),
        Err(_) => true,
    }
}

/// Interval between snapshots of the reporting tables.
pub fn snapshot_interval() -> Duration {
    std::env::var("BAM_SNAPSHOT_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(300))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
