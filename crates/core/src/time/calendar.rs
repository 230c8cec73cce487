// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::daterange::DateRange;
use super::timerange::{normalize, parse_day_ranges, TimeRange};
use super::{local_date, local_instant, TimeError};
use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use std::sync::Arc;

/// How far [`Calendar::next_valid`] searches before giving up.
pub const MAX_LOOKAHEAD_DAYS: u32 = 366;

/// A half-open `[start, end)` interval of epoch seconds.
pub type Span = (i64, i64);

/// A date range whose day-ranges replace the weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    pub dates: DateRange,
    pub ranges: Vec<TimeRange>,
}

impl Exception {
    pub fn parse(daterange: &str, timerange: &str) -> Result<Self, TimeError> {
        Ok(Self { dates: DateRange::parse(daterange)?, ranges: parse_day_ranges(timerange)? })
    }
}

/// A named weekly availability schedule.
///
/// Calendars are assembled with the `&mut self` setters, then frozen behind
/// an `Arc`. Excluded calendars are held as `Arc` snapshots; whoever owns the
/// set of calendars relinks dependents when one of them changes.
#[derive(Debug, Clone)]
pub struct Calendar {
    id: u32,
    name: String,
    timezone: Tz,
    /// Indexed by days from Sunday.
    weekly: [Vec<TimeRange>; 7],
    /// Kept sorted by precedence; insertion order breaks ties.
    exceptions: Vec<Exception>,
    excluded: Vec<Arc<Calendar>>,
}

impl Calendar {
    /// A calendar that is never open.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            timezone: chrono_tz::UTC,
            weekly: Default::default(),
            exceptions: Vec::new(),
            excluded: Vec::new(),
        }
    }

    /// A calendar that is always open (`24x7`).
    pub fn always(id: u32, name: impl Into<String>) -> Self {
        let mut calendar = Self::new(id, name);
        for day in &mut calendar.weekly {
            *day = vec![TimeRange::full_day()];
        }
        calendar
    }

    /// Build from the seven textual day schedules, Sunday first.
    pub fn from_weekly(id: u32, name: impl Into<String>, days: [&str; 7]) -> Result<Self, TimeError> {
        let mut calendar = Self::new(id, name);
        for (slot, text) in calendar.weekly.iter_mut().zip(days) {
            *slot = parse_day_ranges(text)?;
        }
        Ok(calendar)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn set_timezone(&mut self, timezone: Tz) {
        self.timezone = timezone;
    }

    /// Replace one weekday's ranges (`0` is Sunday).
    pub fn set_day(&mut self, weekday: usize, ranges: Vec<TimeRange>) {
        if let Some(slot) = self.weekly.get_mut(weekday) {
            *slot = normalize(ranges);
        }
    }

    pub fn exceptions(&self) -> &[Exception] {
        &self.exceptions
    }

    pub fn add_exception(&mut self, exception: Exception) {
        let at = self
            .exceptions
            .partition_point(|e| e.dates.precedence() <= exception.dates.precedence());
        self.exceptions.insert(at, exception);
    }

    pub fn excluded(&self) -> &[Arc<Calendar>] {
        &self.excluded
    }

    /// Exclude `other`'s open time from this calendar.
    ///
    /// An existing exclusion of the same id is replaced with the newer
    /// snapshot. Self-exclusion and cycles are rejected.
    pub fn add_exclusion(&mut self, other: Arc<Calendar>) -> Result<(), TimeError> {
        if other.id == self.id || other.excludes(self.id) {
            return Err(TimeError::ExclusionCycle { excluding: self.id, excluded: other.id });
        }
        match self.excluded.iter_mut().find(|c| c.id == other.id) {
            Some(slot) => *slot = other,
            None => self.excluded.push(other),
        }
        Ok(())
    }

    /// Whether `id` is excluded, directly or through another exclusion.
    pub fn excludes(&self, id: u32) -> bool {
        self.excluded.iter().any(|c| c.id == id || c.excludes(id))
    }

    /// Open intervals within `[start, end)`, sorted and disjoint.
    pub fn valid_intervals(&self, start: i64, end: i64) -> Vec<Span> {
        if end <= start {
            return Vec::new();
        }
        let mut spans = Vec::new();
        let mut date = self.local_date(start);
        loop {
            if self.local_instant(date, 0) >= end {
                break;
            }
            for range in self.ranges_for(date) {
                let from = self.local_instant(date, range.start()).max(start);
                let to = self.local_instant(date, range.end()).min(end);
                if from < to {
                    spans.push((from, to));
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        let mut spans = merge(spans);
        for excluded in &self.excluded {
            spans = subtract(&spans, &excluded.valid_intervals(start, end));
        }
        spans
    }

    /// Whether the calendar is open at instant `t`.
    pub fn is_valid(&self, t: i64) -> bool {
        !self.valid_intervals(t, t.saturating_add(1)).is_empty()
    }

    /// First open instant at or after `from`, searching at most
    /// [`MAX_LOOKAHEAD_DAYS`] local days ahead.
    pub fn next_valid(&self, from: i64) -> Option<i64> {
        let mut date = self.local_date(from);
        for _ in 0..=MAX_LOOKAHEAD_DAYS {
            let next = date.succ_opt()?;
            let window_start = from.max(self.local_instant(date, 0));
            let window_end = self.local_instant(next, 0);
            if let Some(&(open, _)) = self.valid_intervals(window_start, window_end).first() {
                return Some(open);
            }
            date = next;
        }
        None
    }

    /// Seconds of `[start, end)` during which the calendar is open.
    pub fn duration_intersect(&self, start: i64, end: i64) -> u64 {
        self.valid_intervals(start, end).iter().map(|(from, to)| (to - from).unsigned_abs()).sum()
    }

    fn ranges_for(&self, date: NaiveDate) -> &[TimeRange] {
        match self.exceptions.iter().find(|e| e.dates.matches(date)) {
            Some(exception) => &exception.ranges,
            None => &self.weekly[date.weekday().num_days_from_sunday() as usize],
        }
    }

    fn local_date(&self, t: i64) -> NaiveDate {
        local_date(self.timezone, t)
    }

    fn local_instant(&self, date: NaiveDate, secs: u32) -> i64 {
        local_instant(self.timezone, date, secs)
    }
}

impl PartialEq for Calendar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.timezone == other.timezone
            && self.weekly == other.weekly
            && self.exceptions == other.exceptions
            && self.excluded.len() == other.excluded.len()
            && self.excluded.iter().zip(&other.excluded).all(|(a, b)| a == b)
    }
}

fn merge(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_unstable();
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// `spans` minus `holes`; both sorted and disjoint.
fn subtract(spans: &[Span], holes: &[Span]) -> Vec<Span> {
    let mut out = Vec::with_capacity(spans.len());
    for &(start, end) in spans {
        let mut cursor = start;
        for &(hole_start, hole_end) in holes {
            if hole_end <= cursor {
                continue;
            }
            if hole_start >= end {
                break;
            }
            if hole_start > cursor {
                out.push((cursor, hole_start));
            }
            cursor = cursor.max(hole_end);
            if cursor >= end {
                break;
            }
        }
        if cursor < end {
            out.push((cursor, end));
        }
    }
    out
}

#[cfg(test)]
#[path = "calendar_tests.rs"]
mod tests;
