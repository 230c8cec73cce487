// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared reporting store with all-or-nothing transactions.

use crate::mutation::Mutation;
use crate::snapshot::{load_snapshot, Snapshot, SnapshotError};
use crate::tables::ReportingTables;
use crate::wal::{Wal, WalError};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("injected commit failure")]
    Injected,
}

struct Inner {
    tables: ReportingTables,
    wal: Option<Wal>,
    failing_commits: u32,
}

/// Handle to the reporting tables. Clones share the same tables.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<Inner>>,
}

impl Store {
    /// A store with no journal; commits only change memory.
    pub fn in_memory() -> Self {
        Self::from_parts(ReportingTables::default(), None)
    }

    /// Recover from the snapshot (if any) plus the WAL entries after it.
    pub fn open(wal_path: &Path, snapshot_path: &Path) -> Result<Self, StoreError> {
        let (mut tables, processed_seq) = match load_snapshot(snapshot_path)? {
            Some(snapshot) => {
                info!(
                    seq = snapshot.seq,
                    ba_events = snapshot.tables.ba_events.len(),
                    availabilities = snapshot.tables.availabilities.len(),
                    "loaded snapshot"
                );
                (snapshot.tables, snapshot.seq)
            }
            None => {
                info!("no snapshot found, starting with empty tables");
                (ReportingTables::default(), 0)
            }
        };

        let wal = Wal::open(wal_path, processed_seq)?;
        let entries = wal.entries_after(processed_seq)?;
        let replayed = entries.len();
        for entry in entries {
            for mutation in entry.mutations {
                tables.apply(mutation);
            }
        }
        if replayed > 0 {
            info!(replayed, after_seq = processed_seq, "replayed WAL entries");
        }
        Ok(Self::from_parts(tables, Some(wal)))
    }

    fn from_parts(tables: ReportingTables, wal: Option<Wal>) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner { tables, wal, failing_commits: 0 })) }
    }

    /// Start a transaction over a private copy of the current tables.
    pub fn begin(&self) -> Transaction {
        let working = self.inner.lock().tables.clone();
        Transaction { store: self.clone(), working, log: Vec::new() }
    }

    /// Run `f` against the committed tables.
    pub fn read<R>(&self, f: impl FnOnce(&ReportingTables) -> R) -> R {
        f(&self.inner.lock().tables)
    }

    /// Save a snapshot and drop the WAL entries it covers.
    pub fn checkpoint(&self, snapshot_path: &Path) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.as_ref().map_or(0, Wal::write_seq);
        Snapshot::new(seq, inner.tables.clone()).save(snapshot_path)?;
        if let Some(wal) = inner.wal.as_mut() {
            wal.mark_processed(seq);
            wal.truncate_before(seq + 1)?;
        }
        info!(seq, path = %snapshot_path.display(), "checkpoint saved");
        Ok(seq)
    }

    /// Make the next `count` commits fail without touching anything.
    #[cfg(any(test, feature = "test-support"))]
    pub fn fail_next_commits(&self, count: u32) {
        self.inner.lock().failing_commits = count;
    }
}

/// Pending writes against a [`Store`].
///
/// Reads see the tables as of [`Store::begin`] plus this transaction's own
/// writes. Dropping without [`commit`](Transaction::commit) discards them.
pub struct Transaction {
    store: Store,
    working: ReportingTables,
    log: Vec<Mutation>,
}

impl Transaction {
    pub fn tables(&self) -> &ReportingTables {
        &self.working
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.working.apply(mutation.clone());
        self.log.push(mutation);
    }

    pub fn extend(&mut self, mutations: impl IntoIterator<Item = Mutation>) {
        for mutation in mutations {
            self.push(mutation);
        }
    }

    /// Number of uncommitted mutations.
    pub fn pending(&self) -> usize {
        self.log.len()
    }

    /// Journal and publish every pending mutation at once.
    ///
    /// Other handles see either none or all of them. Returns how many
    /// mutations were committed.
    pub fn commit(self) -> Result<usize, StoreError> {
        if self.log.is_empty() {
            return Ok(0);
        }
        let mut inner = self.store.inner.lock();
        if inner.failing_commits > 0 {
            inner.failing_commits -= 1;
            return Err(StoreError::Injected);
        }
        if let Some(wal) = inner.wal.as_mut() {
            let seq = wal.append(&self.log)?;
            wal.flush()?;
            debug!(seq, mutations = self.log.len(), "committed");
        }
        let count = self.log.len();
        for mutation in self.log {
            inner.tables.apply(mutation);
        }
        Ok(count)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
