// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Date-scoped exception ranges.
//!
//! Five shapes are recognised, from most to least specific:
//!
//! | shape            | example                          |
//! |------------------|----------------------------------|
//! | calendar date    | `2024-12-24 - 2024-12-26 / 2`    |
//! | month date       | `december 25 - january 1`        |
//! | day of month     | `day 1 - 15`, `day -1`           |
//! | month week day   | `thursday 4 november`            |
//! | week day         | `monday 1 - wednesday 1`         |
//!
//! Negative offsets count from the end of the month (`day -1` is the last
//! day, `friday -1` the last Friday).

use super::TimeError;
use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateRange {
    /// Absolute dates. A missing end repeats every `skip` days forever.
    CalendarDate { start: NaiveDate, end: Option<NaiveDate>, skip: u32 },
    MonthDate { start_month: u32, start_day: i32, end_month: u32, end_day: i32, skip: u32 },
    MonthDay { start_day: i32, end_day: i32, skip: u32 },
    MonthWeekDay {
        start_weekday: Weekday,
        start_offset: i32,
        start_month: u32,
        end_weekday: Weekday,
        end_offset: i32,
        end_month: u32,
        skip: u32,
    },
    WeekDay {
        start_weekday: Weekday,
        start_offset: i32,
        end_weekday: Weekday,
        end_offset: i32,
        skip: u32,
    },
}

impl DateRange {
    /// Lower sorts first; the first matching exception of a day wins.
    pub fn precedence(&self) -> u8 {
        match self {
            DateRange::CalendarDate { .. } => 0,
            DateRange::MonthDate { .. } => 1,
            DateRange::MonthDay { .. } => 2,
            DateRange::MonthWeekDay { .. } => 3,
            DateRange::WeekDay { .. } => 4,
        }
    }

    fn skip(&self) -> u32 {
        let skip = match self {
            DateRange::CalendarDate { skip, .. }
            | DateRange::MonthDate { skip, .. }
            | DateRange::MonthDay { skip, .. }
            | DateRange::MonthWeekDay { skip, .. }
            | DateRange::WeekDay { skip, .. } => *skip,
        };
        skip.max(1)
    }

    /// Whether `date` (a local calendar day) falls inside this range.
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.candidates(date).into_iter().any(|(start, end)| {
            let inside = start <= date && end.is_none_or(|end| date <= end);
            inside && (date - start).num_days() % i64::from(self.skip()) == 0
        })
    }

    /// Concrete `(start, end)` instances that could contain `date`.
    ///
    /// Ranges may wrap into the next month or year, so the instance anchored
    /// in the previous period is checked as well.
    fn candidates(&self, date: NaiveDate) -> Vec<(NaiveDate, Option<NaiveDate>)> {
        let mut found = Vec::with_capacity(2);
        match *self {
            DateRange::CalendarDate { start, end, .. } => found.push((start, end)),
            DateRange::MonthDate { start_month, start_day, end_month, end_day, .. } => {
                for year in [date.year() - 1, date.year()] {
                    let Some(start) = month_day(year, start_month, start_day) else { continue };
                    let end = month_day(year, end_month, end_day)
                        .filter(|end| *end >= start)
                        .or_else(|| month_day(year + 1, end_month, end_day));
                    if let Some(end) = end {
                        found.push((start, Some(end)));
                    }
                }
            }
            DateRange::MonthDay { start_day, end_day, .. } => {
                for first in [previous_month(date), first_of_month(date)].into_iter().flatten() {
                    let Some(start) = month_day(first.year(), first.month(), start_day) else {
                        continue;
                    };
                    let end = month_day(first.year(), first.month(), end_day)
                        .filter(|end| *end >= start)
                        .or_else(|| {
                            let next = first.checked_add_months(Months::new(1))?;
                            month_day(next.year(), next.month(), end_day)
                        });
                    if let Some(end) = end {
                        found.push((start, Some(end)));
                    }
                }
            }
            DateRange::MonthWeekDay {
                start_weekday,
                start_offset,
                start_month,
                end_weekday,
                end_offset,
                end_month,
                ..
            } => {
                for year in [date.year() - 1, date.year()] {
                    let Some(start) = nth_weekday(year, start_month, start_weekday, start_offset)
                    else {
                        continue;
                    };
                    let end = nth_weekday(year, end_month, end_weekday, end_offset)
                        .filter(|end| *end >= start)
                        .or_else(|| nth_weekday(year + 1, end_month, end_weekday, end_offset));
                    if let Some(end) = end {
                        found.push((start, Some(end)));
                    }
                }
            }
            DateRange::WeekDay { start_weekday, start_offset, end_weekday, end_offset, .. } => {
                for first in [previous_month(date), first_of_month(date)].into_iter().flatten() {
                    let (year, month) = (first.year(), first.month());
                    let Some(start) = nth_weekday(year, month, start_weekday, start_offset) else {
                        continue;
                    };
                    let end = nth_weekday(year, month, end_weekday, end_offset)
                        .filter(|end| *end >= start)
                        .or_else(|| {
                            let next = first.checked_add_months(Months::new(1))?;
                            nth_weekday(next.year(), next.month(), end_weekday, end_offset)
                        });
                    if let Some(end) = end {
                        found.push((start, Some(end)));
                    }
                }
            }
        }
        found
    }

    /// Parse the textual form used by timeperiod exceptions.
    pub fn parse(text: &str) -> Result<Self, TimeError> {
        let invalid = || TimeError::InvalidDaterange(text.to_string());
        let lowered = text.trim().to_ascii_lowercase();

        let (body, skip) = match lowered.split_once('/') {
            Some((body, skip)) => {
                let skip: u32 = skip.trim().parse().map_err(|_| invalid())?;
                if skip == 0 {
                    return Err(invalid());
                }
                (body.trim(), Some(skip))
            }
            None => (lowered.as_str(), None),
        };

        let (first, second) = match body.split_once(" - ") {
            Some((first, second)) => (first.trim(), Some(second.trim())),
            None => (body, None),
        };
        let start = Side::parse(first).ok_or_else(invalid)?;
        let end = match second {
            Some(second) => start.complete(second).ok_or_else(invalid)?,
            None => start.clone(),
        };
        let open_ended = second.is_none() && skip.is_some();
        let skip = skip.unwrap_or(1);

        let range = match (start, end) {
            (Side::Date(start), Side::Date(end)) => {
                if end < start {
                    return Err(invalid());
                }
                let end = if open_ended { None } else { Some(end) };
                DateRange::CalendarDate { start, end, skip }
            }
            (Side::MonthDate(start_month, start_day), Side::MonthDate(end_month, end_day)) => {
                DateRange::MonthDate { start_month, start_day, end_month, end_day, skip }
            }
            (Side::Day(start_day), Side::Day(end_day)) => {
                DateRange::MonthDay { start_day, end_day, skip }
            }
            (
                Side::MonthWeekDay(start_weekday, start_offset, start_month),
                Side::MonthWeekDay(end_weekday, end_offset, end_month),
            ) => DateRange::MonthWeekDay {
                start_weekday,
                start_offset,
                start_month,
                end_weekday,
                end_offset,
                end_month,
                skip,
            },
            (Side::WeekDay(start_weekday, start_offset), Side::WeekDay(end_weekday, end_offset)) => {
                DateRange::WeekDay { start_weekday, start_offset, end_weekday, end_offset, skip }
            }
            _ => return Err(invalid()),
        };
        Ok(range)
    }
}

/// One endpoint of a textual range.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Side {
    Date(NaiveDate),
    MonthDate(u32, i32),
    Day(i32),
    MonthWeekDay(Weekday, i32, u32),
    WeekDay(Weekday, i32),
}

impl Side {
    fn parse(text: &str) -> Option<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            [date] => NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(Side::Date),
            ["day", day] => offset(day, MAX_DAY_OFFSET).map(Side::Day),
            [name, n] => {
                if let Some(month) = month_number(name) {
                    return offset(n, MAX_DAY_OFFSET).map(|day| Side::MonthDate(month, day));
                }
                let weekday = name.parse::<Weekday>().ok()?;
                offset(n, MAX_WEEK_OFFSET).map(|n| Side::WeekDay(weekday, n))
            }
            [name, n, month] => {
                let weekday = name.parse::<Weekday>().ok()?;
                Some(Side::MonthWeekDay(weekday, offset(n, MAX_WEEK_OFFSET)?, month_number(month)?))
            }
            _ => None,
        }
    }

    /// Parse an end side, which may abbreviate to a bare number that
    /// inherits the start's names (`day 1 - 15`, `july 1 - 10`).
    fn complete(&self, text: &str) -> Option<Self> {
        if text.parse::<i32>().is_ok() {
            return match *self {
                Side::MonthDate(month, _) => offset(text, MAX_DAY_OFFSET).map(|n| Side::MonthDate(month, n)),
                Side::Day(_) => offset(text, MAX_DAY_OFFSET).map(Side::Day),
                Side::MonthWeekDay(weekday, _, month) => {
                    offset(text, MAX_WEEK_OFFSET).map(|n| Side::MonthWeekDay(weekday, n, month))
                }
                Side::WeekDay(weekday, _) => offset(text, MAX_WEEK_OFFSET).map(|n| Side::WeekDay(weekday, n)),
                Side::Date(_) => None,
            };
        }
        Side::parse(text)
    }
}

/// Largest day offset within a month, either direction.
const MAX_DAY_OFFSET: u32 = 31;
/// Largest weekday occurrence within a month, either direction.
const MAX_WEEK_OFFSET: u32 = 5;

fn offset(text: &str, limit: u32) -> Option<i32> {
    text.parse().ok().filter(|n: &i32| *n != 0 && n.unsigned_abs() <= limit)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    MONTHS.iter().position(|m| *m == name).map(|i| i as u32 + 1)
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

fn previous_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_month(date)?.checked_sub_months(Months::new(1))
}

fn last_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_months(Months::new(1))?.pred_opt()
}

/// Day `day` of a month; negative counts back from the last day.
fn month_day(year: i32, month: u32, day: i32) -> Option<NaiveDate> {
    if day > 0 {
        return NaiveDate::from_ymd_opt(year, month, day.unsigned_abs());
    }
    let last = last_of_month(year, month)?;
    let date = last.checked_sub_signed(Duration::days(i64::from(day.unsigned_abs()) - 1))?;
    (date.month() == month).then_some(date)
}

/// The `n`th `weekday` of a month; negative counts from the end.
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: i32) -> Option<NaiveDate> {
    if n > 0 {
        let n = u8::try_from(n).ok()?;
        return NaiveDate::from_weekday_of_month_opt(year, month, weekday, n);
    }
    let last = last_of_month(year, month)?;
    let back = (last.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    let weeks = i64::from(n.unsigned_abs()) - 1;
    let date = last.checked_sub_signed(Duration::days(i64::from(back) + 7 * weeks))?;
    (date.month() == month).then_some(date)
}

#[cfg(test)]
#[path = "daterange_tests.rs"]
mod tests;
