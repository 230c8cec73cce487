// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intra-day open ranges (`"09:00-17:00"`).

use super::TimeError;
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: u32 = 86_400;

/// A half-open `[start, end)` range of seconds since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: u32,
    end: u32,
}

impl TimeRange {
    pub fn new(start: u32, end: u32) -> Result<Self, TimeError> {
        if start > end || end > SECONDS_PER_DAY {
            return Err(TimeError::InvalidTimerange(format!("{start}-{end}")));
        }
        Ok(Self { start, end })
    }

    /// The whole day, `00:00-24:00`.
    pub fn full_day() -> Self {
        Self { start: 0, end: SECONDS_PER_DAY }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Parse a single `HH:MM-HH:MM` range.
    pub fn parse(text: &str) -> Result<Self, TimeError> {
        let invalid = || TimeError::InvalidTimerange(text.to_string());
        let (start, end) = text.trim().split_once('-').ok_or_else(invalid)?;
        let start = parse_clock(start).ok_or_else(invalid)?;
        let end = parse_clock(end).ok_or_else(invalid)?;
        Self::new(start, end).map_err(|_| invalid())
    }
}

fn parse_clock(text: &str) -> Option<u32> {
    let (hours, minutes) = text.trim().split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    if minutes >= 60 || hours > 24 || (hours == 24 && minutes != 0) {
        return None;
    }
    Some(hours * 3600 + minutes * 60)
}

/// Parse a comma-separated list of ranges into a sorted, merged set.
///
/// An empty string is a valid, closed day.
pub fn parse_day_ranges(text: &str) -> Result<Vec<TimeRange>, TimeError> {
    let mut ranges = Vec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        ranges.push(TimeRange::parse(part)?);
    }
    Ok(normalize(ranges))
}

/// Sort ranges, drop empty ones, and coalesce overlapping or touching ranges.
pub(crate) fn normalize(mut ranges: Vec<TimeRange>) -> Vec<TimeRange> {
    ranges.retain(|r| !r.is_empty());
    ranges.sort();
    let mut merged: Vec<TimeRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
#[path = "timerange_tests.rs"]
mod tests;
