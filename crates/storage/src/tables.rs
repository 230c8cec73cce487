// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory reporting tables.
//!
//! Tables are only ever changed through [`crate::Mutation`]s so that the
//! same sequence replayed from the journal rebuilds the same state.

use bam_core::event::{
    DimensionBa, DimensionBaBvRelation, DimensionBaTimeperiodRelation, DimensionBv, DimensionKpi,
    DimensionRecord, DimensionTimeperiod, DimensionTimeperiodException,
    DimensionTimeperiodExclusion,
};
use bam_core::{
    AvailabilityKey, AvailabilityRecord, BaDurationEvent, BaEvent, KpiEvent, LifecycleEvent,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Rows of one lifecycle event kind, keyed by auto-increment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "E: LifecycleEvent")]
pub struct EventTable<E> {
    next_id: u64,
    rows: BTreeMap<u64, E>,
}

impl<E> Default for EventTable<E> {
    fn default() -> Self {
        Self { next_id: 1, rows: BTreeMap::new() }
    }
}

impl<E: LifecycleEvent> EventTable<E> {
    /// Id the next insert will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&E> {
        self.rows.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &E)> {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    /// Rows of one entity in chronological order (start time, then id).
    pub fn rows_for(&self, entity_id: u32) -> Vec<(u64, &E)> {
        let mut rows: Vec<(u64, &E)> =
            self.iter().filter(|(_, row)| row.entity_id() == entity_id).collect();
        rows.sort_by_key(|(id, row)| (row.start_time(), *id));
        rows
    }

    /// Open rows of one entity, chronologically.
    pub fn open_rows(&self, entity_id: u32) -> Vec<(u64, &E)> {
        self.rows_for(entity_id).into_iter().filter(|(_, row)| row.is_open()).collect()
    }

    /// The row with this entity and start time, if any.
    pub fn find(&self, entity_id: u32, start_time: i64) -> Option<(u64, &E)> {
        self.iter().find(|(_, row)| row.entity_id() == entity_id && row.start_time() == start_time)
    }

    /// The closed row of this entity that ends last.
    pub fn latest_closed(&self, entity_id: u32) -> Option<(u64, &E)> {
        self.rows_for(entity_id)
            .into_iter()
            .filter(|(_, row)| !row.is_open())
            .max_by_key(|(id, row)| (row.end_time(), *id))
    }

    /// Every entity with at least one row.
    pub fn entity_ids(&self) -> BTreeSet<u32> {
        self.rows.values().map(LifecycleEvent::entity_id).collect()
    }

    pub(crate) fn insert(&mut self, id: u64, row: E) {
        self.next_id = self.next_id.max(id + 1);
        self.rows.insert(id, row);
    }

    pub(crate) fn set_end(&mut self, id: u64, end_time: Option<i64>) {
        if let Some(row) = self.rows.get_mut(&id) {
            row.set_end_time(end_time);
        }
    }

    pub(crate) fn replace(&mut self, id: u64, row: E) {
        if let Some(slot) = self.rows.get_mut(&id) {
            *slot = row;
        }
    }

    pub(crate) fn delete(&mut self, id: u64) -> Option<E> {
        self.rows.remove(&id)
    }
}

/// A stored duration event and the BA event row it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRow {
    /// `None` when no BA event with the same BA and start was stored.
    pub ba_event_id: Option<u64>,
    #[serde(flatten)]
    pub event: BaDurationEvent,
}

/// Reference data replaced wholesale by each configuration dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionTables {
    pub bas: BTreeMap<u32, DimensionBa>,
    pub bvs: BTreeMap<u32, DimensionBv>,
    pub ba_bv_relations: Vec<DimensionBaBvRelation>,
    pub kpis: BTreeMap<u32, DimensionKpi>,
    pub timeperiods: BTreeMap<u32, DimensionTimeperiod>,
    pub timeperiod_exceptions: Vec<DimensionTimeperiodException>,
    pub timeperiod_exclusions: Vec<DimensionTimeperiodExclusion>,
    pub ba_timeperiods: Vec<DimensionBaTimeperiodRelation>,
}

impl DimensionTables {
    pub fn len(&self) -> usize {
        self.bas.len()
            + self.bvs.len()
            + self.ba_bv_relations.len()
            + self.kpis.len()
            + self.timeperiods.len()
            + self.timeperiod_exceptions.len()
            + self.timeperiod_exclusions.len()
            + self.ba_timeperiods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn insert(&mut self, record: DimensionRecord) {
        match record {
            DimensionRecord::Ba(ba) => {
                self.bas.insert(ba.ba_id, ba);
            }
            DimensionRecord::Bv(bv) => {
                self.bvs.insert(bv.bv_id, bv);
            }
            DimensionRecord::BaBvRelation(rel) => push_unique(&mut self.ba_bv_relations, rel),
            DimensionRecord::Kpi(kpi) => {
                self.kpis.insert(kpi.kpi_id, kpi);
            }
            DimensionRecord::Timeperiod(tp) => {
                self.timeperiods.insert(tp.timeperiod_id, tp);
            }
            DimensionRecord::TimeperiodException(exc) => {
                push_unique(&mut self.timeperiod_exceptions, exc)
            }
            DimensionRecord::TimeperiodExclusion(exc) => {
                push_unique(&mut self.timeperiod_exclusions, exc)
            }
            DimensionRecord::BaTimeperiodRelation(rel) => {
                self.ba_timeperiods
                    .retain(|r| (r.ba_id, r.timeperiod_id) != (rel.ba_id, rel.timeperiod_id));
                self.ba_timeperiods.push(rel);
            }
        }
    }

    pub(crate) fn truncate(&mut self) {
        *self = Self::default();
    }

    /// Timeperiod records in an order that can rebuild a calendar set:
    /// timeperiods, then exceptions, exclusions and BA relations.
    pub fn timeperiod_records(&self) -> Vec<DimensionRecord> {
        let timeperiods = self.timeperiods.values().cloned().map(DimensionRecord::Timeperiod);
        let exceptions =
            self.timeperiod_exceptions.iter().cloned().map(DimensionRecord::TimeperiodException);
        let exclusions =
            self.timeperiod_exclusions.iter().cloned().map(DimensionRecord::TimeperiodExclusion);
        let relations =
            self.ba_timeperiods.iter().cloned().map(DimensionRecord::BaTimeperiodRelation);
        timeperiods.chain(exceptions).chain(exclusions).chain(relations).collect()
    }
}

fn push_unique<T: PartialEq>(rows: &mut Vec<T>, row: T) {
    if !rows.contains(&row) {
        rows.push(row);
    }
}

/// Every table the reporting stream and availability worker touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingTables {
    pub ba_events: EventTable<BaEvent>,
    pub kpi_events: EventTable<KpiEvent>,
    pub ba_durations: Vec<DurationRow>,
    /// `(ba_event_id, kpi_event_id)` pairs.
    pub ba_kpi_links: BTreeSet<(u64, u64)>,
    #[serde(with = "availability_rows")]
    pub availabilities: BTreeMap<AvailabilityKey, AvailabilityRecord>,
    pub dimensions: DimensionTables,
}

impl ReportingTables {
    /// Duration rows of one BA, ordered by start.
    pub fn durations_for(&self, ba_id: u32) -> Vec<&DurationRow> {
        let mut rows: Vec<&DurationRow> =
            self.ba_durations.iter().filter(|row| row.event.ba_id == ba_id).collect();
        rows.sort_by_key(|row| (row.event.real_start_time, row.event.timeperiod_id));
        rows
    }

    /// Day start of the most recent availability row.
    pub fn last_availability_day(&self) -> Option<i64> {
        self.availabilities.keys().map(|key| key.day_start).max()
    }
}

/// Availability rows serialize as a list; JSON maps need string keys.
mod availability_rows {
    use bam_core::{AvailabilityKey, AvailabilityRecord};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        rows: &BTreeMap<AvailabilityKey, AvailabilityRecord>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<&AvailabilityRecord> = rows.values().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<AvailabilityKey, AvailabilityRecord>, D::Error> {
        let list = Vec::<AvailabilityRecord>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|row| (row.key(), row)).collect())
    }
}

#[cfg(test)]
#[path = "tables_tests.rs"]
mod tests;
