// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event methods: name, numeric type tag, log summary, dimension view

use super::{DimensionRecord, Event};

/// Category half of every reporting event's numeric type tag.
pub const BAM_CATEGORY: u32 = 6;

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::BaEvent(_) => "ba:event",
            Event::KpiEvent(_) => "kpi:event",
            Event::BaDurationEvent(_) => "ba:duration",
            Event::DimensionBa(_) => "dimension:ba",
            Event::DimensionBv(_) => "dimension:bv",
            Event::DimensionBaBvRelation(_) => "dimension:ba_bv_relation",
            Event::DimensionKpi(_) => "dimension:kpi",
            Event::DimensionTruncateSignal(_) => "dimension:truncate",
            Event::DimensionTimeperiod(_) => "dimension:timeperiod",
            Event::DimensionBaTimeperiodRelation(_) => "dimension:ba_timeperiod_relation",
            Event::DimensionTimeperiodException(_) => "dimension:timeperiod_exception",
            Event::DimensionTimeperiodExclusion(_) => "dimension:timeperiod_exclusion",
            Event::Rebuild(_) => "rebuild",
        }
    }

    /// Element number within [`BAM_CATEGORY`].
    pub fn element(&self) -> u32 {
        match self {
            Event::BaEvent(_) => 5,
            Event::KpiEvent(_) => 6,
            Event::BaDurationEvent(_) => 7,
            Event::DimensionBa(_) => 8,
            Event::DimensionKpi(_) => 9,
            Event::DimensionBaBvRelation(_) => 10,
            Event::DimensionBv(_) => 11,
            Event::DimensionTruncateSignal(_) => 12,
            Event::Rebuild(_) => 13,
            Event::DimensionTimeperiod(_) => 14,
            Event::DimensionBaTimeperiodRelation(_) => 15,
            Event::DimensionTimeperiodException(_) => 16,
            Event::DimensionTimeperiodExclusion(_) => 17,
        }
    }

    /// Stable numeric tag: category in the high half, element in the low.
    pub fn type_id(&self) -> u32 {
        (BAM_CATEGORY << 16) | self.element()
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::BaEvent(e) => {
                let end = e.end_time.map_or_else(|| "open".to_string(), |end| end.to_string());
                format!("{t} ba={} start={} end={end} status={}", e.ba_id, e.start_time, e.status)
            }
            Event::KpiEvent(e) => {
                let end = e.end_time.map_or_else(|| "open".to_string(), |end| end.to_string());
                format!("{t} kpi={} start={} end={end} status={}", e.kpi_id, e.start_time, e.status)
            }
            Event::BaDurationEvent(e) => {
                format!("{t} ba={} tp={} start={} end={}", e.ba_id, e.timeperiod_id, e.start_time, e.end_time)
            }
            Event::DimensionBa(d) => format!("{t} ba={}", d.ba_id),
            Event::DimensionBv(d) => format!("{t} bv={}", d.bv_id),
            Event::DimensionBaBvRelation(d) => format!("{t} ba={} bv={}", d.ba_id, d.bv_id),
            Event::DimensionKpi(d) => format!("{t} kpi={} ba={}", d.kpi_id, d.ba_id),
            Event::DimensionTruncateSignal(s) => format!("{t} started={}", s.update_started),
            Event::DimensionTimeperiod(d) => format!("{t} tp={}", d.timeperiod_id),
            Event::DimensionBaTimeperiodRelation(d) => {
                format!("{t} ba={} tp={} default={}", d.ba_id, d.timeperiod_id, d.is_default)
            }
            Event::DimensionTimeperiodException(d) => {
                format!("{t} tp={} dates={}", d.timeperiod_id, d.daterange)
            }
            Event::DimensionTimeperiodExclusion(d) => {
                format!("{t} tp={} excluded={}", d.timeperiod_id, d.excluded_timeperiod_id)
            }
            Event::Rebuild(r) => format!("{t} bas={:?}", r.ba_ids),
        }
    }

    /// The dimension row this event carries, if it is one.
    ///
    /// Truncate signals frame dumps but are not rows themselves.
    pub fn as_dimension(&self) -> Option<DimensionRecord> {
        let record = match self {
            Event::DimensionBa(d) => DimensionRecord::Ba(d.clone()),
            Event::DimensionBv(d) => DimensionRecord::Bv(d.clone()),
            Event::DimensionBaBvRelation(d) => DimensionRecord::BaBvRelation(d.clone()),
            Event::DimensionKpi(d) => DimensionRecord::Kpi(d.clone()),
            Event::DimensionTimeperiod(d) => DimensionRecord::Timeperiod(d.clone()),
            Event::DimensionBaTimeperiodRelation(d) => DimensionRecord::BaTimeperiodRelation(d.clone()),
            Event::DimensionTimeperiodException(d) => DimensionRecord::TimeperiodException(d.clone()),
            Event::DimensionTimeperiodExclusion(d) => DimensionRecord::TimeperiodExclusion(d.clone()),
            Event::BaEvent(_)
            | Event::KpiEvent(_)
            | Event::BaDurationEvent(_)
            | Event::DimensionTruncateSignal(_)
            | Event::Rebuild(_) => return None,
        };
        Some(record)
    }
}
