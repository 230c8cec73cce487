// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::availability::WorkerMsg;
use bam_core::event::{DimensionBa, RebuildRequest};
use bam_core::test_support::{ba_closed, ba_open, ba_timeperiod, kpi_closed, timeperiod_dimension, truncate};
use bam_core::{BaDurationEvent, BaStatus};
use tokio::sync::mpsc::UnboundedReceiver;

struct Fixture {
    store: Store,
    cache: CalendarCache,
    stream: ReportingStream,
    rx: UnboundedReceiver<WorkerMsg>,
}

fn fixture(queries_per_transaction: usize) -> Fixture {
    let store = Store::in_memory();
    let cache = CalendarCache::default();
    let (requests, rx) = AvailabilityRequests::channel();
    let stream = ReportingStream::new(
        store.clone(),
        cache.clone(),
        StatusHandle::default(),
        requests,
        StreamConfig::default().queries_per_transaction(queries_per_transaction),
    );
    Fixture { store, cache, stream, rx }
}

fn timeperiod(id: u32, ranges: &str) -> Event {
    Event::DimensionTimeperiod(timeperiod_dimension(id, ranges))
}

fn dimension_ba(ba_id: u32) -> Event {
    Event::DimensionBa(DimensionBa { ba_id, name: format!("ba-{ba_id}"), ..DimensionBa::default() })
}

/// Dump one always-open timeperiod related to BA 1.
fn load_dump(f: &mut Fixture) {
    for event in [truncate(true), dimension_ba(1), timeperiod(1, "00:00-24:00"), ba_timeperiod(1, 1, true)] {
        f.stream.write(&event).unwrap();
    }
    f.stream.write(&truncate(false)).unwrap();
}

fn ba_rows(store: &Store) -> usize {
    store.read(|t| t.ba_events.len())
}

#[test]
fn events_are_acknowledged_on_flush() {
    let mut f = fixture(1000);
    assert_eq!(f.stream.write(&ba_open(1, 100, BaStatus::Ok)).unwrap(), 0);
    assert_eq!(f.stream.write(&ba_open(2, 100, BaStatus::Ok)).unwrap(), 0);
    assert_eq!(f.stream.pending(), 2);
    assert_eq!(ba_rows(&f.store), 0);

    assert_eq!(f.stream.flush().unwrap(), 2);
    assert_eq!(ba_rows(&f.store), 2);
    assert_eq!(f.stream.flush().unwrap(), 0);
}

#[yare::parameterized(
    autocommit = { 1, vec![1, 1, 1] },
    every_two  = { 2, vec![0, 2, 0] },
)]
fn batch_size_bounds_the_transaction(queries_per_transaction: usize, acks: Vec<usize>) {
    let mut f = fixture(queries_per_transaction);
    let got: Vec<usize> = (1..=3)
        .map(|ba_id| f.stream.write(&ba_open(ba_id, 100, BaStatus::Ok)).unwrap())
        .collect();
    assert_eq!(got, acks);
}

#[test]
fn rejected_event_does_not_disturb_the_batch() {
    let mut f = fixture(1000);
    f.cache.add_relation(1, 42, true);
    f.stream.write(&ba_open(1, 0, BaStatus::Ok)).unwrap();

    let err = f.stream.write(&ba_closed(1, 0, 30, BaStatus::Ok)).unwrap_err();
    assert!(matches!(err, ReportingError::ConfigInconsistency(_)));

    assert_eq!(f.stream.flush().unwrap(), 1);
    let open = f.store.read(|t| t.ba_events.open_rows(1).len());
    assert_eq!(open, 1);
}

#[test]
fn failed_commit_acknowledges_nothing() {
    let mut f = fixture(1000);
    f.stream.write(&ba_open(1, 100, BaStatus::Ok)).unwrap();
    f.store.fail_next_commits(1);

    assert!(matches!(f.stream.flush(), Err(ReportingError::Storage(_))));
    assert_eq!(ba_rows(&f.store), 0);

    f.stream.write(&ba_open(2, 100, BaStatus::Ok)).unwrap();
    assert_eq!(f.stream.flush().unwrap(), 1);
    assert_eq!(ba_rows(&f.store), 1);
}

#[test]
fn dump_end_flushes_and_swaps() {
    let mut f = fixture(1000);
    f.stream.write(&ba_open(1, 0, BaStatus::Ok)).unwrap();
    for event in [truncate(true), dimension_ba(1), timeperiod(1, "00:00-24:00"), ba_timeperiod(1, 1, true)] {
        assert_eq!(f.stream.write(&event).unwrap(), 0);
    }
    assert_eq!(f.store.read(|t| t.dimensions.len()), 0);

    // The open BA event, the four dump events and the end signal
    assert_eq!(f.stream.write(&truncate(false)).unwrap(), 6);
    assert_eq!(f.store.read(|t| t.dimensions.len()), 3);
    assert!(f.cache.get(1).is_some());

    f.stream.write(&ba_closed(1, 0, 30, BaStatus::Ok)).unwrap();
    f.stream.flush().unwrap();
    let durations = f.store.read(|t| t.ba_durations.len());
    assert_eq!(durations, 1);
}

#[test]
fn failed_swap_is_swallowed() {
    let mut f = fixture(1000);
    f.stream.write(&truncate(true)).unwrap();
    f.stream.write(&dimension_ba(1)).unwrap();
    f.store.fail_next_commits(1);

    // Nothing to flush, so the injected failure hits the swap itself
    assert_eq!(f.stream.write(&truncate(false)).unwrap(), 3);
    assert_eq!(f.store.read(|t| t.dimensions.len()), 0);
}

#[test]
fn stray_dimensions_are_dropped() {
    let mut f = fixture(1000);
    f.stream.write(&dimension_ba(1)).unwrap();
    f.stream.write(&truncate(false)).unwrap();
    assert_eq!(f.stream.flush().unwrap(), 2);
    assert_eq!(f.store.read(|t| t.dimensions.len()), 0);
}

#[test]
fn rebuild_rederives_and_wakes_the_worker() {
    let mut f = fixture(1000);
    load_dump(&mut f);
    f.stream.write(&ba_closed(1, 0, 30, BaStatus::Ok)).unwrap();
    f.stream.flush().unwrap();

    // A second timeperiod appears without durations derived for it
    f.cache.put(timeperiod_dimension(2, "00:00-24:00").to_calendar().unwrap());
    f.cache.add_relation(1, 2, false);

    f.stream.write(&ba_open(1, 30, BaStatus::Critical)).unwrap();
    let acked = f.stream.write(&Event::Rebuild(RebuildRequest { ba_ids: vec![1] })).unwrap();
    assert_eq!(acked, 2);
    assert_eq!(f.rx.try_recv().unwrap(), WorkerMsg::Rebuild(vec![1]));
    assert_eq!(f.store.read(|t| t.ba_durations.len()), 2);
    assert_eq!(f.stream.status(), "");
}

#[test]
fn rebuild_without_bas_only_wakes_the_worker() {
    let mut f = fixture(1000);
    load_dump(&mut f);
    f.stream.write(&ba_closed(1, 0, 30, BaStatus::Ok)).unwrap();
    f.stream.flush().unwrap();
    let mut txn = f.store.begin();
    txn.push(bam_storage::Mutation::UpsertAvailability(bam_core::AvailabilityRecord::new(
        bam_core::AvailabilityKey { ba_id: 1, timeperiod_id: 1, day_start: 0 },
    )));
    txn.commit().unwrap();
    let durations = f.store.read(|t| t.ba_durations.clone());
    let availabilities = f.store.read(|t| t.availabilities.clone());
    while f.rx.try_recv().is_ok() {}

    let acked = f.stream.write(&Event::Rebuild(RebuildRequest { ba_ids: vec![] })).unwrap();
    assert_eq!(acked, 1);
    assert_eq!(f.rx.try_recv().unwrap(), WorkerMsg::WakeNow);
    assert!(f.rx.try_recv().is_err());
    assert_eq!(f.store.read(|t| t.ba_durations.clone()), durations);
    assert_eq!(f.store.read(|t| t.availabilities.clone()), availabilities);
    assert_eq!(durations.len(), 1);
}

#[test]
fn rebuild_reports_a_stopped_worker() {
    let mut f = fixture(1000);
    drop(f.rx);
    f.stream.write(&ba_open(1, 0, BaStatus::Ok)).unwrap();
    let err = f.stream.write(&Event::Rebuild(RebuildRequest { ba_ids: vec![] })).unwrap_err();
    assert!(matches!(err, ReportingError::WorkerGone));
    // The event flushed before the failure is still reported
    assert_eq!(f.stream.flush().unwrap(), 1);
}

#[test]
fn duration_events_are_replayed_as_is() {
    let mut f = fixture(1);
    let duration = BaDurationEvent {
        ba_id: 4,
        real_start_time: 10,
        start_time: 20,
        end_time: 50,
        duration: 30,
        sla_duration: 25,
        timeperiod_id: 9,
        timeperiod_is_default: false,
    };
    assert_eq!(f.stream.write(&Event::BaDurationEvent(duration.clone())).unwrap(), 1);
    let stored = f.store.read(|t| t.ba_durations[0].event.clone());
    assert_eq!(stored, duration);
}

#[test]
fn kpi_events_reach_their_table() {
    let mut f = fixture(1);
    f.stream.write(&kpi_closed(3, 0, 10, BaStatus::Warning)).unwrap();
    assert_eq!(f.store.read(|t| t.kpi_events.len()), 1);
}

#[test]
fn reconcile_closes_dangling_rows() {
    let mut f = fixture(1000);
    load_dump(&mut f);
    f.stream.write(&ba_open(1, 100, BaStatus::Ok)).unwrap();

    let closed = f.stream.reconcile(ReconcilePolicy { close_last_open: true }, 500).unwrap();
    assert_eq!(closed, 1);
    let end = f.store.read(|t| t.ba_events.get(1).and_then(|e| e.end_time));
    assert_eq!(end, Some(500));
    assert_eq!(f.stream.flush().unwrap(), 1, "flushed event still acknowledged");
}

#[test]
fn cache_reloads_from_stored_dimensions() {
    let mut f = fixture(1000);
    load_dump(&mut f);
    f.cache.clear();
    assert!(f.cache.get(1).is_none());

    assert_eq!(f.stream.reload_cache(), 1);
    assert_eq!(f.cache.relations_for(1).unwrap().len(), 1);
}
