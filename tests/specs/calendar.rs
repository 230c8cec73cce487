// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Calendar queries as seen through the cache.

use crate::prelude::*;
use std::sync::Arc;

#[test]
fn always_open_calendar_counts_every_second() {
    let calendar = always_calendar(1);
    for t in [0, MONDAY + 17, MONDAY + 3 * DAY + 12 * HOUR] {
        assert_eq!(calendar.duration_intersect(t, t + DAY), DAY as u64);
    }
}

#[test]
fn work_week_is_forty_hours() {
    let calendar = work_hours_calendar(2);
    assert_eq!(calendar.duration_intersect(MONDAY, MONDAY + 7 * DAY), 144_000);
}

#[test]
fn validity_does_not_depend_on_query_order() {
    let calendar = work_hours_calendar(2);
    let instants = [MONDAY + 10 * HOUR, MONDAY + 20 * HOUR, MONDAY + 5 * DAY + HOUR];
    let forward: Vec<bool> = instants.iter().map(|&t| calendar.is_valid(t)).collect();
    let backward: Vec<bool> = instants.iter().rev().map(|&t| calendar.is_valid(t)).collect();
    assert_eq!(forward, backward.into_iter().rev().collect::<Vec<_>>());
}

#[test]
fn exclusion_wins_over_the_weekly_schedule() {
    let lunch = Calendar::from_weekly(3, "lunch", ["12:00-13:00"; 7]).unwrap();
    let mut office = work_hours_calendar(2);
    office.add_exclusion(Arc::new(lunch)).unwrap();

    assert!(!office.is_valid(MONDAY + 12 * HOUR + 30 * 60));
    assert!(office.is_valid(MONDAY + 11 * HOUR));
    assert_eq!(office.duration_intersect(MONDAY, MONDAY + DAY), 7 * 3_600);
}

#[test]
fn cyclic_exclusion_in_a_dump_is_skipped() {
    let mut h = Harness::new();
    let mut events = dump(&[(1, "00:00-24:00"), (2, "09:00-17:00")], &[(1, 1, true)]);
    let end = events.pop().unwrap();
    for (excluding, excluded) in [(1, 2), (2, 1)] {
        events.push(Event::DimensionTimeperiodExclusion(DimensionTimeperiodExclusion {
            timeperiod_id: excluding,
            excluded_timeperiod_id: excluded,
        }));
    }
    events.push(end);
    h.feed(&events);

    let calendar = h.cache.get(1).unwrap();
    assert_eq!(calendar.duration_intersect(MONDAY, MONDAY + DAY), 16 * 3_600);
    assert!(h.cache.get(2).unwrap().excluded().is_empty());
}
