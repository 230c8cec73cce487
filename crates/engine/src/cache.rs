// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeperiod calendars and BA relations shared by the ingest path and the
//! availability worker.

use crate::error::CacheError;
use bam_core::event::DimensionRecord;
use bam_core::{Calendar, Exception};
use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// The calendars and relations themselves.
///
/// Calendars are immutable `Arc` snapshots. Updating one replaces it and
/// relinks every calendar that excludes it, so exclusions never point at a
/// stale copy.
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    calendars: HashMap<u32, Arc<Calendar>>,
    /// BA id → timeperiod id → is_default, in insertion order.
    relations: HashMap<u32, IndexMap<u32, bool>>,
}

impl CacheState {
    /// Build from stored timeperiod records, skipping invalid ones.
    pub fn load<'a>(records: impl IntoIterator<Item = &'a DimensionRecord>) -> Self {
        let mut state = Self::default();
        for record in records {
            if let Err(e) = state.apply_dimension(record) {
                warn!(table = record.table(), error = %e, "skipping timeperiod record");
            }
        }
        state
    }

    pub fn get(&self, id: u32) -> Option<Arc<Calendar>> {
        self.calendars.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    /// Insert or replace a calendar.
    pub fn put(&mut self, calendar: Calendar) {
        let id = calendar.id();
        self.calendars.insert(id, Arc::new(calendar));
        self.relink(id);
    }

    pub fn clear(&mut self) {
        self.calendars.clear();
        self.relations.clear();
    }

    pub fn add_relation(&mut self, ba_id: u32, timeperiod_id: u32, is_default: bool) {
        self.relations.entry(ba_id).or_default().insert(timeperiod_id, is_default);
    }

    /// Every BA with at least one timeperiod.
    pub fn related_bas(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.relations.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Calendars related to `ba_id` with their default flag.
    ///
    /// A relation to a timeperiod that is not cached is an error, not an
    /// empty result.
    pub fn relations_for(&self, ba_id: u32) -> Result<Vec<(Arc<Calendar>, bool)>, CacheError> {
        let Some(relations) = self.relations.get(&ba_id) else {
            return Ok(Vec::new());
        };
        relations
            .iter()
            .map(|(&timeperiod_id, &is_default)| {
                self.get(timeperiod_id)
                    .map(|calendar| (calendar, is_default))
                    .ok_or(CacheError::DanglingRelation { ba_id, timeperiod_id })
            })
            .collect()
    }

    pub fn add_exception(&mut self, timeperiod_id: u32, exception: Exception) -> Result<(), CacheError> {
        let mut calendar = self.owned(timeperiod_id)?;
        calendar.add_exception(exception);
        self.put(calendar);
        Ok(())
    }

    pub fn add_exclusion(&mut self, timeperiod_id: u32, excluded_id: u32) -> Result<(), CacheError> {
        let excluded = self.get(excluded_id).ok_or(CacheError::UnknownTimeperiod(excluded_id))?;
        let mut calendar = self.owned(timeperiod_id)?;
        calendar
            .add_exclusion(excluded)
            .map_err(|source| CacheError::InvalidTimeperiod { timeperiod_id, source })?;
        self.put(calendar);
        Ok(())
    }

    /// Fold one timeperiod-related dimension row into the cache; other
    /// rows are ignored.
    pub fn apply_dimension(&mut self, record: &DimensionRecord) -> Result<(), CacheError> {
        match record {
            DimensionRecord::Timeperiod(tp) => {
                let calendar = tp.to_calendar().map_err(|source| CacheError::InvalidTimeperiod {
                    timeperiod_id: tp.timeperiod_id,
                    source,
                })?;
                self.put(calendar);
            }
            DimensionRecord::TimeperiodException(exc) => {
                let exception = exc.to_exception().map_err(|source| {
                    CacheError::InvalidTimeperiod { timeperiod_id: exc.timeperiod_id, source }
                })?;
                self.add_exception(exc.timeperiod_id, exception)?;
            }
            DimensionRecord::TimeperiodExclusion(exc) => {
                self.add_exclusion(exc.timeperiod_id, exc.excluded_timeperiod_id)?;
            }
            DimensionRecord::BaTimeperiodRelation(rel) => {
                self.add_relation(rel.ba_id, rel.timeperiod_id, rel.is_default);
            }
            DimensionRecord::Ba(_)
            | DimensionRecord::Bv(_)
            | DimensionRecord::BaBvRelation(_)
            | DimensionRecord::Kpi(_) => {}
        }
        Ok(())
    }

    fn owned(&self, id: u32) -> Result<Calendar, CacheError> {
        self.calendars
            .get(&id)
            .map(|calendar| Calendar::clone(calendar))
            .ok_or(CacheError::UnknownTimeperiod(id))
    }

    /// Point every calendar that excludes `changed` at its current snapshot,
    /// then do the same for their dependents.
    fn relink(&mut self, changed: u32) {
        let mut queue = vec![changed];
        while let Some(id) = queue.pop() {
            let Some(updated) = self.get(id) else { continue };
            let dependents: Vec<u32> = self
                .calendars
                .values()
                .filter(|c| c.excluded().iter().any(|e| e.id() == id))
                .map(|c| c.id())
                .collect();
            for dependent in dependents {
                let Ok(mut calendar) = self.owned(dependent) else { continue };
                if calendar.add_exclusion(Arc::clone(&updated)).is_ok() {
                    self.calendars.insert(dependent, Arc::new(calendar));
                    queue.push(dependent);
                }
            }
        }
    }
}

/// Shared handle to a [`CacheState`] behind one exclusive lock.
///
/// Single calls lock just for themselves. Sequences that must see one
/// consistent state (dimension swap, rebuild) hold [`CalendarCache::lock`]
/// throughout.
#[derive(Clone, Default)]
pub struct CalendarCache {
    inner: Arc<Mutex<CacheState>>,
}

impl CalendarCache {
    pub fn new(state: CacheState) -> Self {
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    pub fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.inner.lock()
    }

    pub fn get(&self, id: u32) -> Option<Arc<Calendar>> {
        self.inner.lock().get(id)
    }

    pub fn put(&self, calendar: Calendar) {
        self.inner.lock().put(calendar);
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn add_relation(&self, ba_id: u32, timeperiod_id: u32, is_default: bool) {
        self.inner.lock().add_relation(ba_id, timeperiod_id, is_default);
    }

    pub fn relations_for(&self, ba_id: u32) -> Result<Vec<(Arc<Calendar>, bool)>, CacheError> {
        self.inner.lock().relations_for(ba_id)
    }

    /// Swap in a fully built state.
    pub fn replace(&self, state: CacheState) {
        *self.inner.lock() = state;
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
