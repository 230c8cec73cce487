// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the scenarios.

pub use bam_core::event::{DimensionTimeperiodExclusion, RebuildRequest};
pub use bam_core::test_support::*;
pub use bam_core::{BaStatus, Calendar, Event, FakeClock};
pub use bam_engine::{
    AvailabilityRequests, AvailabilityScheduler, CalendarCache, ReconcilePolicy,
    ReportingStream, SchedulerConfig, StatusHandle, StreamConfig, WorkerMsg,
};
pub use bam_storage::Store;
pub use tokio::sync::mpsc::UnboundedReceiver;

pub const HOUR: i64 = 3_600;

/// An in-memory stream with its collaborators exposed.
pub struct Harness {
    pub store: Store,
    pub cache: CalendarCache,
    pub status: StatusHandle,
    pub stream: ReportingStream,
    pub requests: AvailabilityRequests,
    pub rx: UnboundedReceiver<WorkerMsg>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Store::in_memory())
    }

    pub fn with_store(store: Store) -> Self {
        let cache = CalendarCache::default();
        let status = StatusHandle::default();
        let (requests, rx) = AvailabilityRequests::channel();
        let stream = ReportingStream::new(
            store.clone(),
            cache.clone(),
            status.clone(),
            requests.clone(),
            StreamConfig::default(),
        );
        Self { store, cache, status, stream, requests, rx }
    }

    /// Write every event, then flush. Returns the total acknowledged.
    pub fn feed(&mut self, events: &[Event]) -> usize {
        let mut acked = 0;
        for event in events {
            acked += self.stream.write(event).unwrap();
        }
        acked + self.stream.flush().unwrap()
    }

    pub fn scheduler(&self, now: i64) -> AvailabilityScheduler<FakeClock> {
        AvailabilityScheduler::new(
            self.store.clone(),
            self.cache.clone(),
            self.status.clone(),
            SchedulerConfig::default(),
            FakeClock::at(now),
        )
    }
}

/// A configuration dump with the given timeperiods and BA relations.
pub fn dump(timeperiods: &[(u32, &str)], relations: &[(u32, u32, bool)]) -> Vec<Event> {
    let mut events = vec![truncate(true)];
    for &(id, ranges) in timeperiods {
        events.push(Event::DimensionTimeperiod(timeperiod_dimension(id, ranges)));
    }
    for &(ba, tp, default) in relations {
        events.push(ba_timeperiod(ba, tp, default));
    }
    events.push(truncate(false));
    events
}
