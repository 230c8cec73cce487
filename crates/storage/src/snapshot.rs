// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! Snapshots store the complete reporting tables at a point in time,
//! identified by the WAL sequence number. Recovery loads the snapshot
//! and replays WAL entries after that sequence.

use crate::tables::ReportingTables;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {0} is newer than supported version {1}")]
    TooNew(u32, u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version
    #[serde(rename = "v")]
    pub version: u32,
    /// WAL sequence number at the time of snapshot
    pub seq: u64,
    pub tables: ReportingTables,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(seq: u64, tables: ReportingTables) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, seq, tables, created_at: Utc::now() }
    }

    /// Write zstd-compressed JSON atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        {
            let file = BufWriter::new(File::create(&tmp)?);
            let mut encoder = zstd::Encoder::new(file, ZSTD_LEVEL)?;
            serde_json::to_writer(&mut encoder, self)?;
            let mut file = encoder.finish()?;
            file.flush()?;
            file.get_ref().sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Load the snapshot at `path`, if there is a readable one.
///
/// An unreadable snapshot is moved aside to a `.bak` file and treated as
/// missing; a snapshot written by a newer version is an error.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let decoded = zstd::Decoder::new(BufReader::new(File::open(path)?))
        .map_err(SnapshotError::from)
        .and_then(|decoder| serde_json::from_reader::<_, Snapshot>(decoder).map_err(Into::into));
    match decoded {
        Ok(snapshot) if snapshot.version > CURRENT_SNAPSHOT_VERSION => {
            Err(SnapshotError::TooNew(snapshot.version, CURRENT_SNAPSHOT_VERSION))
        }
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) => {
            let bak = rotate_bak_path(path);
            warn!(path = %path.display(), bak = %bak.display(), error = %e, "unreadable snapshot, starting from WAL only");
            fs::rename(path, &bak)?;
            Ok(None)
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
