// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-day availability aggregates.

use serde::{Deserialize, Serialize};

/// Identity of an availability row; unique per BA, timeperiod and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AvailabilityKey {
    pub ba_id: u32,
    pub timeperiod_id: u32,
    /// Epoch seconds of the reporting day's local midnight.
    pub day_start: i64,
}

/// Seconds spent in each status during one day, restricted to the
/// timeperiod's open time, plus counts of incidents opened that day.
///
/// The four status buckets are disjoint; `downtime` overlaps them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub ba_id: u32,
    pub timeperiod_id: u32,
    pub day_start: i64,
    pub available: u64,
    pub unavailable: u64,
    pub degraded: u64,
    pub unknown: u64,
    pub downtime: u64,
    pub alert_unavailable_opened: u32,
    pub alert_degraded_opened: u32,
    pub alert_unknown_opened: u32,
    pub nb_downtime: u32,
    pub timeperiod_is_default: bool,
}

impl AvailabilityRecord {
    pub fn new(key: AvailabilityKey) -> Self {
        Self {
            ba_id: key.ba_id,
            timeperiod_id: key.timeperiod_id,
            day_start: key.day_start,
            ..Default::default()
        }
    }

    pub fn key(&self) -> AvailabilityKey {
        AvailabilityKey {
            ba_id: self.ba_id,
            timeperiod_id: self.timeperiod_id,
            day_start: self.day_start,
        }
    }

    /// Sum of the four status buckets.
    pub fn status_seconds(&self) -> u64 {
        self.available + self.unavailable + self.degraded + self.unknown
    }
}
