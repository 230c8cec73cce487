// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daily availability from stored events.

use crate::prelude::*;
use bam_core::test_support::strategies::arb_interval;
use bam_engine::AvailabilityBuilder;
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #[test]
    fn builder_ignores_insertion_order(
        intervals in proptest::collection::vec(arb_interval(MONDAY - HOUR, MONDAY + DAY + HOUR), 1..12),
    ) {
        let calendar = work_hours_calendar(2);
        let mut forward = AvailabilityBuilder::new(MONDAY, MONDAY + DAY);
        let mut backward = AvailabilityBuilder::new(MONDAY, MONDAY + DAY);
        for &(status, start, end, down) in &intervals {
            forward.add_interval(status, start, Some(end), down, &calendar);
        }
        for &(status, start, end, down) in intervals.iter().rev() {
            backward.add_interval(status, start, Some(end), down, &calendar);
        }
        prop_assert_eq!(forward.result(1, 2), backward.result(1, 2));
    }
}

fn monday_record(h: &Harness, ba_id: u32, timeperiod_id: u32) -> bam_core::AvailabilityRecord {
    h.store
        .read(|t| {
            t.availabilities
                .values()
                .find(|r| r.ba_id == ba_id && r.timeperiod_id == timeperiod_id && r.day_start == MONDAY)
                .cloned()
        })
        .unwrap()
}

#[test]
fn contiguous_day_fills_exactly_the_open_time() {
    let mut h = Harness::new();
    h.feed(&dump(&[(1, "00:00-24:00"), (2, "09:00-17:00")], &[(1, 1, true), (1, 2, false)]));
    h.feed(&[
        ba_open(1, MONDAY - HOUR, BaStatus::Ok),
        ba_open(1, MONDAY + 6 * HOUR, BaStatus::Critical),
        ba_open(1, MONDAY + 10 * HOUR, BaStatus::Warning),
        ba_open(1, MONDAY + 20 * HOUR, BaStatus::Unknown),
    ]);

    let scheduler = h.scheduler(MONDAY + DAY + HOUR);
    let plan = h.store.read(|t| scheduler.plan_nightly(t));
    assert_eq!(plan.days(SchedulerConfig::default().timezone), vec![MONDAY]);
    assert_eq!(scheduler.run_cycle(&plan).unwrap(), 2);

    let always = monday_record(&h, 1, 1);
    assert_eq!(
        (always.available, always.unavailable, always.degraded, always.unknown),
        (6 * 3_600, 4 * 3_600, 10 * 3_600, 4 * 3_600)
    );
    assert_eq!(always.status_seconds(), always_calendar(1).duration_intersect(MONDAY, MONDAY + DAY));
    assert_eq!(
        (always.alert_unavailable_opened, always.alert_degraded_opened, always.alert_unknown_opened),
        (1, 1, 1)
    );
    assert!(always.timeperiod_is_default);

    let office = monday_record(&h, 1, 2);
    assert_eq!((office.unavailable, office.degraded), (3_600, 7 * 3_600));
    assert_eq!(office.status_seconds(), 8 * 3_600);
    assert!(!office.timeperiod_is_default);
}

#[test]
fn downtime_overlaps_the_status_buckets() {
    let mut h = Harness::new();
    h.feed(&dump(&[(1, "00:00-24:00")], &[(3, 1, true)]));
    let down = bam_core::BaEvent::builder()
        .ba_id(3)
        .start_time(MONDAY + 12 * HOUR)
        .status(BaStatus::Critical)
        .in_downtime(true)
        .build();
    h.feed(&[ba_open(3, MONDAY - DAY, BaStatus::Ok), Event::BaEvent(down)]);

    let scheduler = h.scheduler(MONDAY + DAY + HOUR);
    let plan = h.store.read(|t| scheduler.plan_nightly(t));
    scheduler.run_cycle(&plan).unwrap();

    let record = monday_record(&h, 3, 1);
    assert_eq!(record.downtime, 12 * 3_600);
    assert_eq!(record.nb_downtime, 1);
    assert_eq!(record.status_seconds(), DAY as u64);
}

#[tokio::test]
async fn rebuild_event_recomputes_through_the_worker() {
    let mut h = Harness::new();
    h.feed(&dump(&[(1, "00:00-24:00")], &[(1, 1, true)]));
    h.feed(&[ba_closed(1, MONDAY, MONDAY + 2 * DAY, BaStatus::Ok)]);

    // A stale row the rebuild has to replace
    let mut txn = h.store.begin();
    let mut stale = bam_core::AvailabilityRecord::new(bam_core::AvailabilityKey {
        ba_id: 1,
        timeperiod_id: 1,
        day_start: MONDAY,
    });
    stale.unavailable = 42;
    txn.push(bam_storage::Mutation::UpsertAvailability(stale));
    txn.commit().unwrap();

    let acked = h.feed(&[Event::Rebuild(RebuildRequest { ba_ids: vec![1] })]);
    assert_eq!(acked, 1);

    let (_, rx) = AvailabilityRequests::channel();
    let rx = std::mem::replace(&mut h.rx, rx);
    let handle = h.scheduler(MONDAY + 5 * DAY).spawn(h.requests.clone(), rx);
    let mut cycles = handle.cycles();
    tokio::time::timeout(Duration::from_secs(5), cycles.wait_for(|n| *n >= 1)).await.unwrap().unwrap();

    let rows: Vec<(i64, u64, u64)> = h.store.read(|t| {
        t.availabilities.values().map(|r| (r.day_start, r.available, r.unavailable)).collect()
    });
    assert_eq!(rows, vec![(MONDAY, DAY as u64, 0), (MONDAY + DAY, DAY as u64, 0)]);
    assert_eq!(h.status.get(), "");
    handle.shutdown().await;
}
