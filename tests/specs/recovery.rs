// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart from the journal and snapshot.

use crate::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Paths {
    _dir: TempDir,
    wal: PathBuf,
    snapshot: PathBuf,
}

fn paths() -> Paths {
    let dir = tempfile::tempdir().unwrap();
    let wal = dir.path().join("reporting.wal");
    let snapshot = dir.path().join("snapshot.zst");
    Paths { _dir: dir, wal, snapshot }
}

fn open(wal: &Path, snapshot: &Path) -> Harness {
    let h = Harness::with_store(Store::open(wal, snapshot).unwrap());
    h.stream.reload_cache();
    h
}

#[test]
fn committed_batches_survive_a_restart() {
    let p = paths();
    let before = {
        let mut h = open(&p.wal, &p.snapshot);
        h.feed(&dump(&[(1, "00:00-24:00")], &[(1, 1, true)]));
        h.feed(&[ba_open(1, MONDAY, BaStatus::Ok)]);
        h.store.checkpoint(&p.snapshot).unwrap();
        // Only in the journal
        h.feed(&[ba_open(1, MONDAY + HOUR, BaStatus::Critical)]);
        h.store.read(Clone::clone)
    };

    let h = open(&p.wal, &p.snapshot);
    assert_eq!(h.store.read(Clone::clone), before);
    assert_eq!(h.store.read(|t| t.durations_for(1).len()), 1);
    assert!(h.cache.get(1).is_some());
    assert!(h.cache.relations_for(1).unwrap().iter().any(|(c, default)| c.id() == 1 && *default));
}

#[test]
fn rolled_back_batch_is_not_replayed() {
    let p = paths();
    {
        let mut h = open(&p.wal, &p.snapshot);
        h.feed(&[ba_open(2, MONDAY, BaStatus::Ok)]);
        h.store.fail_next_commits(1);
        h.stream.write(&ba_open(2, MONDAY + HOUR, BaStatus::Warning)).unwrap();
        assert!(h.stream.flush().is_err());
    }

    let h = open(&p.wal, &p.snapshot);
    let rows: Vec<(i64, Option<i64>)> =
        h.store.read(|t| t.ba_events.rows_for(2).iter().map(|(_, e)| (e.start_time, e.end_time)).collect());
    assert_eq!(rows, vec![(MONDAY, None)]);
}

#[test]
fn restart_closes_what_the_previous_run_left_open() {
    let p = paths();
    {
        let mut h = open(&p.wal, &p.snapshot);
        h.feed(&dump(&[(1, "00:00-24:00")], &[(4, 1, true)]));
        h.feed(&[ba_open(4, MONDAY, BaStatus::Critical)]);
    }

    let mut h = open(&p.wal, &p.snapshot);
    let closed = h.stream.reconcile(ReconcilePolicy::default(), MONDAY + 2 * HOUR).unwrap();
    assert_eq!(closed, 1);
    let durations: Vec<(i64, u64)> =
        h.store.read(|t| t.durations_for(4).iter().map(|r| (r.event.duration, r.event.sla_duration)).collect());
    assert_eq!(durations, vec![(2 * HOUR, 2 * 3_600)]);
}
