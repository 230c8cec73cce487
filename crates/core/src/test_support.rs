// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::{
    BaEvent, DimensionBaTimeperiodRelation, DimensionTimeperiod, Event, KpiEvent, TruncateSignal,
};
use crate::time::Calendar;
use crate::BaStatus;

/// 2024-01-01T00:00:00Z, a Monday.
pub const MONDAY: i64 = 1_704_067_200;
pub const DAY: i64 = 86_400;

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::BaStatus;
    use proptest::prelude::*;

    pub fn arb_status() -> impl Strategy<Value = BaStatus> {
        prop_oneof![
            Just(BaStatus::Ok),
            Just(BaStatus::Warning),
            Just(BaStatus::Critical),
            Just(BaStatus::Unknown),
        ]
    }

    /// `(status, start, end, in_downtime)` with `start < end`, within
    /// `[lo, hi]`.
    pub fn arb_interval(lo: i64, hi: i64) -> impl Strategy<Value = (BaStatus, i64, i64, bool)> {
        (arb_status(), lo..hi, 1i64..(hi - lo), any::<bool>())
            .prop_map(move |(status, start, len, down)| (status, start, (start + len).min(hi), down))
    }
}

// ── Calendar fixtures ───────────────────────────────────────────────────────

/// Open every day, all day.
pub fn always_calendar(id: u32) -> Calendar {
    Calendar::always(id, format!("24x7-{id}"))
}

/// Open 09:00-17:00 Monday to Friday, UTC.
pub fn work_hours_calendar(id: u32) -> Calendar {
    let open = "09:00-17:00";
    Calendar::from_weekly(id, format!("work-{id}"), ["", open, open, open, open, open, ""])
        .unwrap_or_else(|_| Calendar::new(id, "work"))
}

/// Timeperiod dimension open all week with the given day ranges.
pub fn timeperiod_dimension(id: u32, ranges: &str) -> DimensionTimeperiod {
    DimensionTimeperiod {
        timeperiod_id: id,
        name: format!("tp-{id}"),
        timezone: String::new(),
        sunday: ranges.to_string(),
        monday: ranges.to_string(),
        tuesday: ranges.to_string(),
        wednesday: ranges.to_string(),
        thursday: ranges.to_string(),
        friday: ranges.to_string(),
        saturday: ranges.to_string(),
    }
}

// ── Event factory functions ─────────────────────────────────────────────────

pub fn ba_open(ba_id: u32, start: i64, status: BaStatus) -> Event {
    Event::BaEvent(BaEvent::builder().ba_id(ba_id).start_time(start).status(status).build())
}

pub fn ba_closed(ba_id: u32, start: i64, end: i64, status: BaStatus) -> Event {
    Event::BaEvent(
        BaEvent::builder().ba_id(ba_id).start_time(start).end_time(Some(end)).status(status).build(),
    )
}

pub fn kpi_closed(kpi_id: u32, start: i64, end: i64, status: BaStatus) -> Event {
    Event::KpiEvent(
        KpiEvent::builder()
            .kpi_id(kpi_id)
            .start_time(start)
            .end_time(Some(end))
            .status(status)
            .build(),
    )
}

pub fn truncate(update_started: bool) -> Event {
    Event::DimensionTruncateSignal(TruncateSignal { update_started })
}

pub fn ba_timeperiod(ba_id: u32, timeperiod_id: u32, is_default: bool) -> Event {
    Event::DimensionBaTimeperiodRelation(DimensionBaTimeperiodRelation {
        ba_id,
        timeperiod_id,
        is_default,
    })
}
