// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    morning   = { "09:00-12:30", 32_400, 45_000 },
    full_day  = { "00:00-24:00", 0, 86_400 },
    padded    = { " 08:00 - 18:00 ", 28_800, 64_800 },
    closed    = { "00:00-00:00", 0, 0 },
)]
fn parses_single_range(text: &str, start: u32, end: u32) {
    let range = TimeRange::parse(text).unwrap();
    assert_eq!((range.start(), range.end()), (start, end));
}

#[yare::parameterized(
    no_dash        = { "09:00" },
    reversed       = { "17:00-09:00" },
    past_midnight  = { "23:00-24:30" },
    bad_minutes    = { "09:75-10:00" },
    not_a_number   = { "ab:00-10:00" },
    missing_colon  = { "0900-1000" },
)]
fn rejects_malformed_range(text: &str) {
    assert!(matches!(TimeRange::parse(text), Err(TimeError::InvalidTimerange(_))));
}

#[test]
fn day_ranges_are_sorted_and_merged() {
    let ranges = parse_day_ranges("13:00-17:00,08:00-12:00,11:00-13:00").unwrap();
    assert_eq!(ranges, vec![TimeRange::new(28_800, 61_200).unwrap()]);
}

#[test]
fn day_ranges_keep_gaps() {
    let ranges = parse_day_ranges("08:00-12:00,14:00-18:00").unwrap();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[1].start(), 50_400);
}

#[test]
fn empty_text_is_a_closed_day() {
    assert!(parse_day_ranges("").unwrap().is_empty());
    assert!(parse_day_ranges("00:00-00:00").unwrap().is_empty());
}

#[test]
fn one_bad_range_fails_the_list() {
    assert!(parse_day_ranges("08:00-12:00,nope").is_err());
}
