// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Open/close bookkeeping for BA and KPI events.
//!
//! Each incoming event is turned into a list of mutations against the
//! transaction's current view before any of them is pushed, so an event
//! that fails leaves the transaction untouched.

use crate::cache::{CacheState, CalendarCache};
use crate::error::ReportingError;
use crate::status::StatusHandle;
use bam_core::{BaDurationEvent, BaEvent, EntityKind, KpiEvent, LifecycleEvent};
use bam_storage::{EventRow, Mutation, ReportingTables, RowOp, Store, Transaction};
use tracing::{debug, info, warn};

/// What reconciliation does with the chronologically last open row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Close it at the current time instead of leaving it open.
    pub close_last_open: bool,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self { close_last_open: true }
    }
}

/// Side effects of a row closing or disappearing.
trait LedgerRow: EventRow {
    fn on_closed(
        cache: &CacheState,
        tables: &ReportingTables,
        row_id: u64,
        row: &Self,
    ) -> Result<Vec<Mutation>, ReportingError>;

    fn on_removed(row: &Self) -> Vec<Mutation>;
}

impl LedgerRow for BaEvent {
    /// One duration event per related timeperiod the span overlaps.
    fn on_closed(
        cache: &CacheState,
        _tables: &ReportingTables,
        _row_id: u64,
        row: &Self,
    ) -> Result<Vec<Mutation>, ReportingError> {
        let end = match row.end_time {
            Some(end) if end > row.start_time => end,
            _ => return Ok(Vec::new()),
        };
        let mut durations = Vec::new();
        for (calendar, is_default) in cache.relations_for(row.ba_id)? {
            let Some(start) = calendar.next_valid(row.start_time) else { continue };
            if start >= end {
                continue;
            }
            durations.push(Mutation::InsertBaDuration(BaDurationEvent {
                ba_id: row.ba_id,
                real_start_time: row.start_time,
                start_time: start,
                end_time: end,
                duration: end - start,
                sla_duration: calendar.duration_intersect(start, end),
                timeperiod_id: calendar.id(),
                timeperiod_is_default: is_default,
            }));
        }
        Ok(durations)
    }

    fn on_removed(row: &Self) -> Vec<Mutation> {
        vec![Mutation::DeleteBaDurationsOf { ba_id: row.ba_id, real_start_time: row.start_time }]
    }
}

impl LedgerRow for KpiEvent {
    /// Link to the events of the owning BA whose span contains the KPI
    /// event's start.
    fn on_closed(
        _cache: &CacheState,
        tables: &ReportingTables,
        row_id: u64,
        row: &Self,
    ) -> Result<Vec<Mutation>, ReportingError> {
        let Some(kpi) = tables.dimensions.kpis.get(&row.kpi_id) else {
            debug!(kpi_id = row.kpi_id, "no KPI dimension, event left unlinked");
            return Ok(Vec::new());
        };
        let start = row.start_time;
        Ok(tables
            .ba_events
            .rows_for(kpi.ba_id)
            .into_iter()
            .filter(|(_, ba)| ba.start_time <= start && !matches!(ba.end_time, Some(end) if end < start))
            .map(|(ba_event_id, _)| Mutation::LinkKpiEvent { ba_event_id, kpi_event_id: row_id })
            .collect())
    }

    fn on_removed(_row: &Self) -> Vec<Mutation> {
        Vec::new()
    }
}

/// Mutations that fold `event` into its table.
fn plan<E: LedgerRow>(
    cache: &CacheState,
    tables: &ReportingTables,
    event: &E,
) -> Result<Vec<Mutation>, ReportingError> {
    let table = E::table(tables);
    let entity_id = event.entity_id();
    let start = event.start_time();
    let mut plan = Vec::new();

    if event.is_ephemeral() {
        match table.find(entity_id, start) {
            Some((id, row)) => {
                plan.extend(E::on_removed(row));
                plan.push(E::mutation(RowOp::Delete { id }));
            }
            None => debug!(kind = %E::KIND, entity_id, start, "ephemeral event without row"),
        }
        return Ok(plan);
    }

    if let Some((id, row)) = table.find(entity_id, start) {
        if !row.is_open() {
            plan.extend(E::on_removed(row));
        }
        plan.push(E::mutation(RowOp::Replace { id, event: event.clone() }));
        if !event.is_open() {
            plan.extend(E::on_closed(cache, tables, id, event)?);
        }
        return Ok(plan);
    }

    if !event.is_open() {
        // A reopened row keeps its own start; later notifications carry the
        // start they were reopened at
        let open = table.open_rows(entity_id).into_iter().rev().find(|(_, row)| row.start_time() <= start);
        if let Some((id, row)) = open {
            debug!(kind = %E::KIND, entity_id, row_id = id, row_start = row.start_time(), "closing continued event");
            let mut closed = row.clone();
            closed.set_end_time(event.end_time());
            plan.push(E::mutation(RowOp::SetEnd { id, end_time: event.end_time() }));
            plan.extend(E::on_closed(cache, tables, id, &closed)?);
            return Ok(plan);
        }
        // The open notification was missed
        let id = table.next_id();
        plan.push(E::mutation(RowOp::Insert { id, event: event.clone() }));
        plan.extend(E::on_closed(cache, tables, id, event)?);
        return Ok(plan);
    }

    if let Some((id, row)) = table.latest_closed(entity_id) {
        if row.end_time() == Some(start) && row.same_state(event) && table.open_rows(entity_id).is_empty() {
            debug!(kind = %E::KIND, entity_id, row_id = id, "reopening event");
            plan.extend(E::on_removed(row));
            plan.push(E::mutation(RowOp::SetEnd { id, end_time: None }));
            return Ok(plan);
        }
    }

    for (id, row) in table.open_rows(entity_id) {
        if row.start_time() >= start {
            continue;
        }
        let mut closed = row.clone();
        closed.set_end_time(Some(start));
        plan.push(E::mutation(RowOp::SetEnd { id, end_time: Some(start) }));
        plan.extend(E::on_closed(cache, tables, id, &closed)?);
    }
    plan.push(E::mutation(RowOp::Insert { id: table.next_id(), event: event.clone() }));
    Ok(plan)
}

/// Close every open row that is not the last one of its entity.
fn reconcile_table<E: LedgerRow>(
    cache: &CacheState,
    tables: &ReportingTables,
    policy: ReconcilePolicy,
    now: i64,
) -> (Vec<Mutation>, usize) {
    let table = E::table(tables);
    let mut plan = Vec::new();
    let mut closed = 0;
    for entity_id in table.entity_ids() {
        let rows = table.rows_for(entity_id);
        for (i, (id, row)) in rows.iter().enumerate() {
            if !row.is_open() {
                continue;
            }
            let end = match rows.get(i + 1) {
                Some((_, next)) => next.start_time(),
                None if policy.close_last_open => now.max(row.start_time()),
                None => continue,
            };
            let mut row = E::clone(row);
            row.set_end_time(Some(end));
            plan.push(E::mutation(RowOp::SetEnd { id: *id, end_time: Some(end) }));
            match E::on_closed(cache, tables, *id, &row) {
                Ok(mutations) => plan.extend(mutations),
                Err(e) => warn!(kind = %E::KIND, entity_id, error = %e, "closed without derived rows"),
            }
            closed += 1;
        }
    }
    (plan, closed)
}

/// Applies BA and KPI events and keeps their derived rows in step.
#[derive(Clone)]
pub struct EventLedger {
    cache: CalendarCache,
    status: StatusHandle,
}

impl EventLedger {
    pub fn new(cache: CalendarCache, status: StatusHandle) -> Self {
        Self { cache, status }
    }

    pub fn apply_ba_event(&self, txn: &mut Transaction, event: &BaEvent) -> Result<(), ReportingError> {
        self.apply(txn, event)
    }

    pub fn apply_kpi_event(&self, txn: &mut Transaction, event: &KpiEvent) -> Result<(), ReportingError> {
        self.apply(txn, event)
    }

    fn apply<E: LedgerRow>(&self, txn: &mut Transaction, event: &E) -> Result<(), ReportingError> {
        let mutations = {
            let cache = self.cache.lock();
            plan(&cache, txn.tables(), event)?
        };
        debug!(
            kind = %E::KIND,
            entity_id = event.entity_id(),
            start = event.start_time(),
            mutations = mutations.len(),
            "event applied"
        );
        txn.extend(mutations);
        Ok(())
    }

    /// Repair open rows left behind by a crash so at most one row per
    /// entity is open. Returns how many rows were closed.
    pub fn reconcile(
        &self,
        txn: &mut Transaction,
        kind: EntityKind,
        policy: ReconcilePolicy,
        now: i64,
    ) -> usize {
        let (mutations, closed) = {
            let cache = self.cache.lock();
            match kind {
                EntityKind::Ba => reconcile_table::<BaEvent>(&cache, txn.tables(), policy, now),
                EntityKind::Kpi => reconcile_table::<KpiEvent>(&cache, txn.tables(), policy, now),
            }
        };
        if closed > 0 {
            info!(%kind, closed, "reconciled open events");
        }
        txn.extend(mutations);
        closed
    }

    /// Re-derive the duration events of `ba_ids` from their closed events,
    /// in a transaction of its own. An empty list touches nothing.
    ///
    /// The calendar cache stays locked throughout so the availability worker
    /// never sees the durations half rebuilt. Returns how many events were
    /// processed.
    pub fn apply_rebuild_signal(&self, store: &Store, ba_ids: &[u32]) -> Result<usize, ReportingError> {
        if ba_ids.is_empty() {
            return Ok(0);
        }
        let cache = self.cache.lock();
        let mut txn = store.begin();
        let ids = ba_ids.to_vec();
        txn.push(Mutation::DeleteBaDurations { ba_ids: ids.clone() });

        let events: Vec<BaEvent> = txn
            .tables()
            .ba_events
            .iter()
            .filter(|(_, e)| ids.contains(&e.ba_id) && !e.is_open())
            .map(|(_, e)| e.clone())
            .collect();
        let total = events.len();
        info!(bas = ids.len(), events = total, "rebuilding duration events");

        for (i, event) in events.iter().enumerate() {
            self.status.set(format!("rebuilding: ba event {}/{}", i + 1, total));
            match BaEvent::on_closed(&cache, txn.tables(), 0, event) {
                Ok(mutations) => txn.extend(mutations),
                Err(e) => warn!(ba_id = event.ba_id, start = event.start_time, error = %e, "no durations derived"),
            }
        }
        let committed = txn.commit();
        self.status.clear();
        committed?;
        Ok(total)
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
