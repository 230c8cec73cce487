// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dimension dumps replace the previous set in one step.

use crate::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn stored_timeperiods(store: &Store) -> BTreeSet<u32> {
    store.read(|t| t.dimensions.timeperiods.keys().copied().collect())
}

#[test]
fn readers_see_the_old_set_or_the_new_one() {
    let mut h = Harness::new();
    h.feed(&dump(&[(1, "00:00-24:00"), (2, "09:00-17:00")], &[(1, 1, true)]));

    let old: BTreeSet<u32> = [1, 2].into();
    let new: BTreeSet<u32> = (10..60).collect();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let store = h.store.clone();
        let cache = h.cache.clone();
        let done = Arc::clone(&done);
        let (old, new) = (old.clone(), new.clone());
        thread::spawn(move || {
            let mut observed = 0;
            while !done.load(Ordering::Acquire) {
                let seen = stored_timeperiods(&store);
                assert!(seen == old || seen == new, "partial dimension set: {seen:?}");
                let cached = cache.lock().len();
                assert!(cached == old.len() || cached == new.len(), "partial cache: {cached}");
                observed += 1;
            }
            observed
        })
    };

    let timeperiods: Vec<(u32, &str)> = new.iter().map(|&id| (id, "08:00-18:00")).collect();
    h.feed(&dump(&timeperiods, &[(1, 10, true)]));
    done.store(true, Ordering::Release);

    assert!(reader.join().unwrap() > 0);
    assert_eq!(stored_timeperiods(&h.store), new);
    assert!(h.cache.get(1).is_none());
    assert!(h.cache.get(10).is_some());
}

#[test]
fn second_start_discards_the_buffered_batch() {
    let mut h = Harness::new();
    h.feed(&dump(&[(1, "00:00-24:00")], &[]));
    h.feed(&[
        truncate(true),
        Event::DimensionTimeperiod(timeperiod_dimension(5, "00:00-12:00")),
        truncate(true),
        Event::DimensionTimeperiod(timeperiod_dimension(6, "12:00-24:00")),
    ]);
    // Nothing applied until the dump ends
    assert_eq!(stored_timeperiods(&h.store), [1].into());

    h.feed(&[truncate(false)]);
    assert_eq!(stored_timeperiods(&h.store), [6].into());
    assert!(h.cache.get(5).is_none());
    assert_eq!(h.cache.get(6).unwrap().duration_intersect(MONDAY, MONDAY + DAY), 12 * 3_600);
}

#[test]
fn failed_swap_keeps_the_previous_dump() {
    let mut h = Harness::new();
    h.feed(&dump(&[(1, "00:00-24:00")], &[(1, 1, true)]));

    h.store.fail_next_commits(1);
    h.feed(&dump(&[(2, "09:00-17:00")], &[]));

    assert_eq!(stored_timeperiods(&h.store), [1].into());
    assert!(h.cache.get(1).is_some());
    assert!(h.cache.get(2).is_none());
}
