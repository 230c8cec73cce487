// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bam_core::{AvailabilityKey, AvailabilityRecord, BaStatus, Calendar};
use tracing::warn;

/// Accumulates one day of status intervals for one BA and timeperiod.
///
/// Only sums are kept, so the result does not depend on the order the
/// intervals arrive in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityBuilder {
    day_start: i64,
    day_end: i64,
    available: u64,
    unavailable: u64,
    degraded: u64,
    unknown: u64,
    downtime: u64,
    alert_unavailable_opened: u32,
    alert_degraded_opened: u32,
    alert_unknown_opened: u32,
    nb_downtime: u32,
    timeperiod_is_default: Option<bool>,
}

impl AvailabilityBuilder {
    pub fn new(day_start: i64, day_end: i64) -> Self {
        Self {
            day_start,
            day_end,
            available: 0,
            unavailable: 0,
            degraded: 0,
            unknown: 0,
            downtime: 0,
            alert_unavailable_opened: 0,
            alert_degraded_opened: 0,
            alert_unknown_opened: 0,
            nb_downtime: 0,
            timeperiod_is_default: None,
        }
    }

    /// Add `[start, end)`; an open interval (`end == None`) runs to the end
    /// of the day.
    pub fn add_interval(
        &mut self,
        status: BaStatus,
        start: i64,
        end: Option<i64>,
        in_downtime: bool,
        calendar: &Calendar,
    ) {
        let end = end.unwrap_or(self.day_end);
        if end < self.day_start {
            return;
        }
        let opened_today = start >= self.day_start && start < self.day_end;
        let seconds = calendar.duration_intersect(start.max(self.day_start), end.min(self.day_end));

        match status {
            BaStatus::Ok => self.available += seconds,
            BaStatus::Warning => {
                self.degraded += seconds;
                if opened_today {
                    self.alert_degraded_opened += 1;
                }
            }
            BaStatus::Critical => {
                self.unavailable += seconds;
                if opened_today {
                    self.alert_unavailable_opened += 1;
                }
            }
            BaStatus::Unknown => {
                self.unknown += seconds;
                if opened_today {
                    self.alert_unknown_opened += 1;
                }
            }
        }
        if in_downtime {
            self.downtime += seconds;
            if opened_today {
                self.nb_downtime += 1;
            }
        }
    }

    /// Record the relation's default flag. Every row feeding one builder
    /// should carry the same flag; a disagreement is logged and the latest
    /// value kept.
    pub fn set_timeperiod_is_default(&mut self, is_default: bool) {
        if let Some(previous) = self.timeperiod_is_default {
            if previous != is_default {
                warn!(day_start = self.day_start, previous, is_default, "conflicting default flag for one timeperiod");
            }
        }
        self.timeperiod_is_default = Some(is_default);
    }

    pub fn result(&self, ba_id: u32, timeperiod_id: u32) -> AvailabilityRecord {
        AvailabilityRecord {
            available: self.available,
            unavailable: self.unavailable,
            degraded: self.degraded,
            unknown: self.unknown,
            downtime: self.downtime,
            alert_unavailable_opened: self.alert_unavailable_opened,
            alert_degraded_opened: self.alert_degraded_opened,
            alert_unknown_opened: self.alert_unknown_opened,
            nb_downtime: self.nb_downtime,
            timeperiod_is_default: self.timeperiod_is_default.unwrap_or(false),
            ..AvailabilityRecord::new(AvailabilityKey { ba_id, timeperiod_id, day_start: self.day_start })
        }
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
