// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BA event lifecycle and derived duration events.

use crate::prelude::*;

#[test]
fn closed_event_yields_one_duration_per_timeperiod() {
    let mut h = Harness::new();
    h.feed(&dump(&[(1, "00:00-24:00")], &[(1, 1, true)]));
    h.feed(&[ba_open(1, 0, BaStatus::Ok), ba_closed(1, 0, 30, BaStatus::Ok)]);

    let durations = h.store.read(|t| t.durations_for(1).into_iter().cloned().collect::<Vec<_>>());
    assert_eq!(durations.len(), 1);
    let d = &durations[0].event;
    assert_eq!(
        (d.timeperiod_id, d.start_time, d.end_time, d.duration, d.sla_duration, d.timeperiod_is_default),
        (1, 0, 30, 30, 30, true)
    );
}

#[test]
fn complementary_timeperiods_share_the_day() {
    let mut h = Harness::new();
    h.feed(&dump(
        &[(2, "09:00-17:00"), (3, "00:00-09:00,17:00-24:00")],
        &[(5, 2, true), (5, 3, false)],
    ));
    h.feed(&[ba_open(5, MONDAY, BaStatus::Critical), ba_closed(5, MONDAY, MONDAY + DAY, BaStatus::Critical)]);

    let slas: Vec<(u32, u64)> = h.store.read(|t| {
        t.durations_for(5).iter().map(|row| (row.event.timeperiod_id, row.event.sla_duration)).collect()
    });
    assert_eq!(slas.len(), 2);
    assert!(slas.contains(&(2, 28_800)));
    assert!(slas.contains(&(3, 57_600)));
    assert_eq!(slas.iter().map(|(_, s)| s).sum::<u64>(), DAY as u64);
}

#[test]
fn at_most_one_open_event_per_ba() {
    let mut h = Harness::new();
    h.feed(&[
        ba_open(1, 100, BaStatus::Ok),
        ba_open(1, 200, BaStatus::Warning),
        ba_open(1, 300, BaStatus::Critical),
        ba_open(2, 150, BaStatus::Ok),
    ]);
    let open: Vec<usize> = h.store.read(|t| vec![t.ba_events.open_rows(1).len(), t.ba_events.open_rows(2).len()]);
    assert_eq!(open, vec![1, 1]);
}

#[test]
fn reconciliation_repairs_dangling_open_rows() {
    let mut h = Harness::new();
    // Rows written by a ledger that never saw each other, as after a crash
    for start in [100, 200, 300] {
        let mut txn = h.store.begin();
        let id = txn.tables().ba_events.next_id();
        let event = bam_core::BaEvent::builder().ba_id(9).start_time(start).build();
        txn.push(bam_storage::Mutation::BaEvent(bam_storage::RowOp::Insert { id, event }));
        txn.commit().unwrap();
    }

    let closed = h.stream.reconcile(ReconcilePolicy { close_last_open: false }, 1_000).unwrap();
    assert_eq!(closed, 2);
    let rows: Vec<(i64, Option<i64>)> = h.store.read(|t| {
        t.ba_events.rows_for(9).iter().map(|(_, e)| (e.start_time, e.end_time)).collect()
    });
    assert_eq!(rows, vec![(100, Some(200)), (200, Some(300)), (300, None)]);
}

#[test]
fn kpi_events_link_to_the_ba_event_they_occurred_in() {
    let mut h = Harness::new();
    let kpi = Event::DimensionKpi(bam_core::event::DimensionKpi {
        kpi_id: 4,
        ba_id: 1,
        service_description: "http".to_string(),
        ..Default::default()
    });
    h.feed(&[truncate(true), kpi, truncate(false)]);
    h.feed(&[ba_open(1, 0, BaStatus::Ok), ba_open(1, 50, BaStatus::Critical), kpi_closed(4, 60, 90, BaStatus::Critical)]);

    let links = h.store.read(|t| t.ba_kpi_links.iter().copied().collect::<Vec<_>>());
    assert_eq!(links, vec![(2, 1)]);
}
