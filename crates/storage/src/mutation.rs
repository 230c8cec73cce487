// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative table writes.
//!
//! A `Mutation` is the unit journaled to the WAL. Applying is total:
//! writes aimed at rows that no longer exist are no-ops.

use crate::tables::{DurationRow, EventTable, ReportingTables};
use bam_core::{
    AvailabilityRecord, BaDurationEvent, BaEvent, DimensionRecord, KpiEvent, LifecycleEvent,
};
use serde::{Deserialize, Serialize};

/// A write against one lifecycle event table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "row", rename_all = "snake_case")]
#[serde(bound = "E: LifecycleEvent")]
pub enum RowOp<E> {
    Insert { id: u64, event: E },
    SetEnd { id: u64, end_time: Option<i64> },
    Replace { id: u64, event: E },
    Delete { id: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    BaEvent(RowOp<BaEvent>),
    KpiEvent(RowOp<KpiEvent>),
    /// Stored against the BA event with the same BA and start time.
    InsertBaDuration(BaDurationEvent),
    DeleteBaDurations { ba_ids: Vec<u32> },
    /// Drop the durations derived from one BA event.
    DeleteBaDurationsOf { ba_id: u32, real_start_time: i64 },
    LinkKpiEvent { ba_event_id: u64, kpi_event_id: u64 },
    UpsertAvailability(AvailabilityRecord),
    DeleteAvailabilities { ba_ids: Vec<u32> },
    TruncateDimensions,
    InsertDimension(DimensionRecord),
}

/// Lifecycle events that have a table of their own.
pub trait EventRow: LifecycleEvent {
    fn table(tables: &ReportingTables) -> &EventTable<Self>;
    fn table_mut(tables: &mut ReportingTables) -> &mut EventTable<Self>;
    fn mutation(op: RowOp<Self>) -> Mutation;
}

impl EventRow for BaEvent {
    fn table(tables: &ReportingTables) -> &EventTable<Self> {
        &tables.ba_events
    }
    fn table_mut(tables: &mut ReportingTables) -> &mut EventTable<Self> {
        &mut tables.ba_events
    }
    fn mutation(op: RowOp<Self>) -> Mutation {
        Mutation::BaEvent(op)
    }
}

impl EventRow for KpiEvent {
    fn table(tables: &ReportingTables) -> &EventTable<Self> {
        &tables.kpi_events
    }
    fn table_mut(tables: &mut ReportingTables) -> &mut EventTable<Self> {
        &mut tables.kpi_events
    }
    fn mutation(op: RowOp<Self>) -> Mutation {
        Mutation::KpiEvent(op)
    }
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::BaEvent(_) => "ba_event",
            Mutation::KpiEvent(_) => "kpi_event",
            Mutation::InsertBaDuration(_) => "insert_ba_duration",
            Mutation::DeleteBaDurations { .. } => "delete_ba_durations",
            Mutation::DeleteBaDurationsOf { .. } => "delete_ba_durations_of",
            Mutation::LinkKpiEvent { .. } => "link_kpi_event",
            Mutation::UpsertAvailability(_) => "upsert_availability",
            Mutation::DeleteAvailabilities { .. } => "delete_availabilities",
            Mutation::TruncateDimensions => "truncate_dimensions",
            Mutation::InsertDimension(_) => "insert_dimension",
        }
    }
}

fn apply_row<E: LifecycleEvent>(table: &mut EventTable<E>, op: RowOp<E>) -> Option<u64> {
    match op {
        RowOp::Insert { id, event } => table.insert(id, event),
        RowOp::SetEnd { id, end_time } => table.set_end(id, end_time),
        RowOp::Replace { id, event } => table.replace(id, event),
        RowOp::Delete { id } => return table.delete(id).map(|_| id),
    }
    None
}

impl ReportingTables {
    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::BaEvent(op) => {
                if let Some(deleted) = apply_row(&mut self.ba_events, op) {
                    self.ba_kpi_links.retain(|(ba, _)| *ba != deleted);
                }
            }
            Mutation::KpiEvent(op) => {
                if let Some(deleted) = apply_row(&mut self.kpi_events, op) {
                    self.ba_kpi_links.retain(|(_, kpi)| *kpi != deleted);
                }
            }
            Mutation::InsertBaDuration(event) => {
                let ba_event_id =
                    self.ba_events.find(event.ba_id, event.real_start_time).map(|(id, _)| id);
                self.ba_durations.retain(|row| {
                    (row.event.ba_id, row.event.real_start_time, row.event.timeperiod_id)
                        != (event.ba_id, event.real_start_time, event.timeperiod_id)
                });
                self.ba_durations.push(DurationRow { ba_event_id, event });
            }
            Mutation::DeleteBaDurations { ba_ids } => {
                self.ba_durations.retain(|row| !ba_ids.contains(&row.event.ba_id));
            }
            Mutation::DeleteBaDurationsOf { ba_id, real_start_time } => {
                self.ba_durations.retain(|row| {
                    (row.event.ba_id, row.event.real_start_time) != (ba_id, real_start_time)
                });
            }
            Mutation::LinkKpiEvent { ba_event_id, kpi_event_id } => {
                self.ba_kpi_links.insert((ba_event_id, kpi_event_id));
            }
            Mutation::UpsertAvailability(record) => {
                self.availabilities.insert(record.key(), record);
            }
            Mutation::DeleteAvailabilities { ba_ids } => {
                self.availabilities.retain(|key, _| !ba_ids.contains(&key.ba_id));
            }
            Mutation::TruncateDimensions => self.dimensions.truncate(),
            Mutation::InsertDimension(record) => self.dimensions.insert(record),
        }
    }
}
