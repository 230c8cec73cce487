// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One day of availability from stored rows.

use super::AvailabilityBuilder;
use crate::cache::CacheState;
use bam_core::AvailabilityRecord;
use bam_storage::ReportingTables;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Availability of every `(BA, timeperiod)` with activity in
/// `[day_start, day_end)`.
///
/// Closed BA events contribute through their duration rows, which already
/// name one timeperiod. Open BA events have no duration rows yet, so they
/// are expanded against every timeperiod related to the BA.
pub(crate) fn compute_day(
    tables: &ReportingTables,
    cache: &CacheState,
    ba_filter: Option<&BTreeSet<u32>>,
    day_start: i64,
    day_end: i64,
) -> Vec<AvailabilityRecord> {
    let selected = |ba_id: u32| match ba_filter {
        Some(ids) => ids.contains(&ba_id),
        None => true,
    };
    let mut builders: BTreeMap<(u32, u32), AvailabilityBuilder> = BTreeMap::new();

    for row in &tables.ba_durations {
        let duration = &row.event;
        if !selected(duration.ba_id)
            || duration.start_time >= day_end
            || duration.end_time <= day_start
        {
            continue;
        }
        let Some(event) = row.ba_event_id.and_then(|id| tables.ba_events.get(id)) else {
            debug!(ba_id = duration.ba_id, start = duration.real_start_time, "duration row without BA event");
            continue;
        };
        let Some(calendar) = cache.get(duration.timeperiod_id) else {
            warn!(ba_id = duration.ba_id, timeperiod_id = duration.timeperiod_id, "duration row for unknown timeperiod");
            continue;
        };
        let builder = builders
            .entry((duration.ba_id, duration.timeperiod_id))
            .or_insert_with(|| AvailabilityBuilder::new(day_start, day_end));
        builder.add_interval(
            event.status,
            duration.start_time,
            Some(duration.end_time),
            event.in_downtime,
            &calendar,
        );
        builder.set_timeperiod_is_default(duration.timeperiod_is_default);
    }

    for (_, event) in tables.ba_events.iter() {
        if event.end_time.is_some() || event.start_time >= day_end || !selected(event.ba_id) {
            continue;
        }
        let relations = match cache.relations_for(event.ba_id) {
            Ok(relations) => relations,
            Err(e) => {
                warn!(ba_id = event.ba_id, error = %e, "skipping open BA event");
                continue;
            }
        };
        for (calendar, is_default) in relations {
            let builder = builders
                .entry((event.ba_id, calendar.id()))
                .or_insert_with(|| AvailabilityBuilder::new(day_start, day_end));
            builder.add_interval(event.status, event.start_time, None, event.in_downtime, &calendar);
            builder.set_timeperiod_is_default(is_default);
        }
    }

    builders
        .into_iter()
        .map(|((ba_id, timeperiod_id), builder)| builder.result(ba_id, timeperiod_id))
        .collect()
}

#[cfg(test)]
#[path = "compute_tests.rs"]
mod tests;
