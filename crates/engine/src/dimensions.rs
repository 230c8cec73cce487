// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration dumps.
//!
//! Dimension rows arrive bracketed by truncate signals. They are buffered
//! until the closing signal, then swapped in with one transaction so
//! readers see either the previous dump or the new one.

use crate::cache::{CacheState, CalendarCache};
use crate::error::ReportingError;
use bam_core::DimensionRecord;
use bam_storage::{Mutation, Store};
use std::mem;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
enum SwapState {
    #[default]
    Idle,
    Buffering(Vec<DimensionRecord>),
}

pub struct DimensionSwapper {
    state: SwapState,
    cache: CalendarCache,
}

impl DimensionSwapper {
    pub fn new(cache: CalendarCache) -> Self {
        Self { state: SwapState::Idle, cache }
    }

    pub fn is_buffering(&self) -> bool {
        matches!(self.state, SwapState::Buffering(_))
    }

    /// Number of rows waiting for the end of the dump.
    pub fn buffered(&self) -> usize {
        match &self.state {
            SwapState::Idle => 0,
            SwapState::Buffering(records) => records.len(),
        }
    }

    /// Start a dump. A dump still buffering never received its end and is
    /// dropped.
    pub fn begin(&mut self) {
        if let SwapState::Buffering(records) = &self.state {
            warn!(discarded = records.len(), "dimension dump restarted before it ended");
        }
        self.state = SwapState::Buffering(Vec::new());
        debug!("dimension dump started");
    }

    pub fn buffer(&mut self, record: DimensionRecord) -> Result<(), ReportingError> {
        match &mut self.state {
            SwapState::Buffering(records) => {
                records.push(record);
                Ok(())
            }
            SwapState::Idle => Err(ReportingError::ProtocolViolation(format!(
                "{} dimension outside of a dump",
                record.table()
            ))),
        }
    }

    /// End the dump, returning its rows. `None` if no dump was started.
    pub fn take_dump(&mut self) -> Option<Vec<DimensionRecord>> {
        match mem::take(&mut self.state) {
            SwapState::Buffering(records) => Some(records),
            SwapState::Idle => None,
        }
    }

    /// Replace every dimension table and the calendar cache with `records`.
    ///
    /// The new calendar set is built from the staged tables and installed
    /// only once the commit succeeds; on failure both the tables and the
    /// cache keep the previous dump. Returns how many rows were stored.
    pub fn swap(&self, store: &Store, records: Vec<DimensionRecord>) -> Result<usize, ReportingError> {
        let mut cache = self.cache.lock();
        let count = records.len();
        let mut txn = store.begin();
        txn.push(Mutation::TruncateDimensions);
        txn.extend(records.into_iter().map(Mutation::InsertDimension));
        let staged = CacheState::load(&txn.tables().dimensions.timeperiod_records());
        txn.commit()?;
        info!(rows = count, timeperiods = staged.len(), "dimensions replaced");
        *cache = staged;
        Ok(count)
    }
}

#[cfg(test)]
#[path = "dimensions_tests.rs"]
mod tests;
