// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest side of the reporting subsystem.
//!
//! Events are applied strictly in arrival order into one open transaction.
//! Committing it acknowledges every event it holds; the count returned by
//! [`ReportingStream::write`] and [`ReportingStream::flush`] is what the
//! producer may consider durable.

use crate::availability::AvailabilityRequests;
use crate::cache::{CacheState, CalendarCache};
use crate::dimensions::DimensionSwapper;
use crate::error::ReportingError;
use crate::ledger::{EventLedger, ReconcilePolicy};
use crate::status::StatusHandle;
use bam_core::{EntityKind, Event};
use bam_storage::{Mutation, Store, Transaction};
use std::mem;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Mutations per transaction before it is committed; below 2 every
    /// event commits on its own.
    pub queries_per_transaction: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { queries_per_transaction: 1000 }
    }
}

impl StreamConfig {
    pub fn queries_per_transaction(mut self, n: usize) -> Self {
        self.queries_per_transaction = n;
        self
    }
}

pub struct ReportingStream {
    store: Store,
    cache: CalendarCache,
    status: StatusHandle,
    ledger: EventLedger,
    swapper: DimensionSwapper,
    requests: AvailabilityRequests,
    config: StreamConfig,
    txn: Option<Transaction>,
    /// Events applied to `txn` or otherwise consumed since the last flush.
    pending_events: usize,
    /// Events already durable whose count a failed call could not report.
    unreported: usize,
}

impl ReportingStream {
    pub fn new(
        store: Store,
        cache: CalendarCache,
        status: StatusHandle,
        requests: AvailabilityRequests,
        config: StreamConfig,
    ) -> Self {
        Self {
            ledger: EventLedger::new(cache.clone(), status.clone()),
            swapper: DimensionSwapper::new(cache.clone()),
            store,
            cache,
            status,
            requests,
            config,
            txn: None,
            pending_events: 0,
            unreported: 0,
        }
    }

    pub fn status(&self) -> String {
        self.status.get()
    }

    /// Events consumed but not yet acknowledged.
    pub fn pending(&self) -> usize {
        self.pending_events
    }

    /// Apply one event; returns how many events became durable.
    ///
    /// A failing event is rejected without touching the open transaction.
    pub fn write(&mut self, event: &Event) -> Result<usize, ReportingError> {
        debug!(event = %event.log_summary(), "write");
        match event {
            Event::BaEvent(e) => {
                let txn = self.txn.get_or_insert_with(|| self.store.begin());
                self.ledger.apply_ba_event(txn, e)?;
            }
            Event::KpiEvent(e) => {
                let txn = self.txn.get_or_insert_with(|| self.store.begin());
                self.ledger.apply_kpi_event(txn, e)?;
            }
            Event::BaDurationEvent(d) => {
                let txn = self.txn.get_or_insert_with(|| self.store.begin());
                txn.push(Mutation::InsertBaDuration(d.clone()));
            }
            Event::DimensionTruncateSignal(signal) if signal.update_started => self.swapper.begin(),
            Event::DimensionTruncateSignal(_) => return self.end_dump(),
            Event::Rebuild(request) => return self.rebuild(&request.ba_ids),
            other => {
                if let Some(record) = other.as_dimension() {
                    if let Err(e) = self.swapper.buffer(record) {
                        warn!(error = %e, "dropping dimension");
                    }
                }
            }
        }
        self.pending_events += 1;

        let pending = self.txn.as_ref().map_or(0, Transaction::pending);
        if self.config.queries_per_transaction < 2 || pending >= self.config.queries_per_transaction {
            return self.flush();
        }
        Ok(0)
    }

    /// Commit the open transaction; returns how many events it acknowledged.
    ///
    /// On failure the whole batch is rolled back and none of it is
    /// acknowledged.
    pub fn flush(&mut self) -> Result<usize, ReportingError> {
        let events = mem::take(&mut self.pending_events);
        if let Some(txn) = self.txn.take() {
            let mutations = txn.commit()?;
            debug!(events, mutations, "flushed");
        }
        Ok(events + mem::take(&mut self.unreported))
    }

    /// Close open rows left by an unclean stop, in a transaction of its own.
    pub fn reconcile(&mut self, policy: ReconcilePolicy, now: i64) -> Result<usize, ReportingError> {
        let acked = self.flush()?;
        self.unreported += acked;
        let mut txn = self.store.begin();
        let closed = self.ledger.reconcile(&mut txn, EntityKind::Ba, policy, now)
            + self.ledger.reconcile(&mut txn, EntityKind::Kpi, policy, now);
        txn.commit()?;
        Ok(closed)
    }

    /// Rebuild the calendar cache from the stored dimension tables.
    pub fn reload_cache(&self) -> usize {
        let state = self.store.read(|tables| CacheState::load(&tables.dimensions.timeperiod_records()));
        let count = state.len();
        self.cache.replace(state);
        info!(timeperiods = count, "calendar cache loaded");
        count
    }

    fn end_dump(&mut self) -> Result<usize, ReportingError> {
        if !self.swapper.is_buffering() {
            warn!("dimension dump ended without a start");
            self.pending_events += 1;
            return Ok(0);
        }
        let acked = self.flush()?;
        let records = self.swapper.take_dump().unwrap_or_default();
        // Swap failures are not the producer's to retry; the next dump
        // replaces whatever is stored.
        if let Err(e) = self.swapper.swap(&self.store, records) {
            warn!(error = %e, "dimension swap failed");
        }
        Ok(acked + 1)
    }

    fn rebuild(&mut self, ba_ids: &[u32]) -> Result<usize, ReportingError> {
        let acked = self.flush()?;
        self.unreported += acked;
        if ba_ids.is_empty() {
            // Nothing to re-derive; availability catches up from the last stored day
            debug!("rebuild request without BAs, incremental availability only");
            self.requests.wake_now()?;
        } else {
            self.ledger.apply_rebuild_signal(&self.store, ba_ids)?;
            self.requests.rebuild(ba_ids.to_vec())?;
        }
        Ok(mem::take(&mut self.unreported) + 1)
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
