// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log of committed transactions.
//!
//! One JSON line per commit: `{"seq": N, "mutations": [...]}`. A file whose
//! tail cannot be parsed is rotated to `.bak` on open and rewritten with its
//! valid prefix.

use crate::mutation::Mutation;
use crate::snapshot::rotate_bak_path;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub mutations: Vec<Mutation>,
}

pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    write_seq: u64,
    processed_seq: u64,
}

impl Wal {
    /// Open or create the log at `path`.
    ///
    /// `processed_seq` is the sequence already folded into the snapshot the
    /// caller loaded.
    pub fn open(path: &Path, processed_seq: u64) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut write_seq = processed_seq;
        if path.exists() {
            let (entries, corrupt) = read_entries(path)?;
            if corrupt {
                let bak = rotate_bak_path(path);
                warn!(path = %path.display(), bak = %bak.display(), valid = entries.len(), "corrupt WAL, keeping valid prefix");
                fs::rename(path, &bak)?;
                let mut clean = BufWriter::new(File::create(path)?);
                for entry in &entries {
                    serde_json::to_writer(&mut clean, entry)?;
                    clean.write_all(b"\n")?;
                }
                clean.flush()?;
            }
            if let Some(last) = entries.last() {
                write_seq = write_seq.max(last.seq);
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { path: path.to_path_buf(), writer: BufWriter::new(file), write_seq, processed_seq })
    }

    /// Buffer one commit's mutations; returns its sequence number.
    pub fn append(&mut self, mutations: &[Mutation]) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        serde_json::to_writer(&mut self.writer, &WalEntryRef { seq, mutations })?;
        self.writer.write_all(b"\n")?;
        self.write_seq = seq;
        Ok(seq)
    }

    /// Write buffered entries through to disk.
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    /// Entries with a sequence greater than `seq`, stopping at the first
    /// unreadable line.
    pub fn entries_after(&self, seq: u64) -> Result<Vec<WalEntry>, WalError> {
        let (entries, _) = read_entries(&self.path)?;
        Ok(entries.into_iter().filter(|e| e.seq > seq).collect())
    }

    /// Drop entries before `seq`; used once a snapshot covers them.
    pub fn truncate_before(&mut self, seq: u64) -> Result<(), WalError> {
        self.flush()?;
        let keep = self.entries_after(seq.saturating_sub(1))?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut out = BufWriter::new(File::create(&tmp)?);
            for entry in &keep {
                serde_json::to_writer(&mut out, entry)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        let file = OpenOptions::new().append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        Ok(())
    }
}

#[derive(Serialize)]
struct WalEntryRef<'a> {
    seq: u64,
    mutations: &'a [Mutation],
}

/// Parse entries up to the first bad line; the flag reports whether one
/// was found.
fn read_entries(path: &Path) -> Result<(Vec<WalEntry>, bool), WalError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.split(b'\n') {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<WalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(_) => return Ok((entries, true)),
        }
    }
    Ok((entries, false))
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
