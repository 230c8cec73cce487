// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeperiod calendar engine.
//!
//! A [`Calendar`] is a weekly schedule of open day-ranges, overridden on
//! specific dates by [`Exception`]s and masked by other calendars it
//! excludes. All instants are integer seconds since the Unix epoch; every
//! range is half-open.

mod calendar;
mod daterange;
mod timerange;

pub use calendar::{Calendar, Exception, Span, MAX_LOOKAHEAD_DAYS};
pub use daterange::DateRange;
pub use timerange::{parse_day_ranges, TimeRange, SECONDS_PER_DAY};

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

/// Errors raised while building calendars.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid time range '{0}'")]
    InvalidTimerange(String),
    #[error("invalid date range '{0}'")]
    InvalidDaterange(String),
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
    #[error("timeperiod {excluding} cannot exclude timeperiod {excluded}: exclusion cycle")]
    ExclusionCycle { excluding: u32, excluded: u32 },
}

/// Parse an IANA timezone name; empty means UTC.
pub fn parse_timezone(name: &str) -> Result<Tz, TimeError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(chrono_tz::UTC);
    }
    name.parse().map_err(|_| TimeError::UnknownTimezone(name.to_string()))
}

/// Calendar day of instant `t` in `tz`.
///
/// Instants outside the representable calendar saturate to its first or
/// last day.
pub fn local_date(tz: Tz, t: i64) -> NaiveDate {
    match DateTime::from_timestamp(t, 0) {
        Some(at) => at.with_timezone(&tz).date_naive(),
        None if t < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}

/// The instant `secs` past local midnight of `date` in `tz`.
///
/// `secs` may be a full day, meaning the next midnight. Ambiguous local
/// times resolve to the earlier instant; local times skipped by a DST jump
/// resolve using the offset in force before it.
pub fn local_instant(tz: Tz, date: NaiveDate, secs: u32) -> i64 {
    if secs >= SECONDS_PER_DAY {
        return match date.succ_opt() {
            Some(next) => local_instant(tz, next, 0),
            None => i64::MAX,
        };
    }
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(at) => at.timestamp(),
        LocalResult::Ambiguous(earlier, _) => earlier.timestamp(),
        LocalResult::None => {
            let before = naive.checked_sub_signed(chrono::Duration::hours(3)).unwrap_or(naive);
            let offset = tz
                .offset_from_local_datetime(&before)
                .earliest()
                .map(|o| o.fix().local_minus_utc())
                .unwrap_or(0);
            naive.and_utc().timestamp() - i64::from(offset)
        }
    }
}

/// Local midnight starting the day that contains `t`.
pub fn day_start(tz: Tz, t: i64) -> i64 {
    local_instant(tz, local_date(tz, t), 0)
}

/// Local midnight following the day that starts at or contains `t`.
pub fn next_day_start(tz: Tz, t: i64) -> i64 {
    local_instant(tz, local_date(tz, t), SECONDS_PER_DAY)
}
