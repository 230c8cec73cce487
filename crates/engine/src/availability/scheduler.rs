// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Availability worker.
//!
//! A single task owns every availability cycle, so the nightly run and
//! explicit rebuilds never overlap. The task sleeps until the next local
//! midnight; a message on its channel wakes it early.

use super::compute::compute_day;
use crate::cache::CalendarCache;
use crate::error::ReportingError;
use crate::status::StatusHandle;
use bam_core::time::{day_start, next_day_start};
use bam_core::{BaDurationEvent, BaEvent, Clock};
use bam_storage::{Mutation, ReportingTables, Store};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Zone whose midnights bound reporting days.
    pub timezone: Tz,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { timezone: chrono_tz::UTC }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMsg {
    /// Compute every day after the last stored one.
    WakeNow,
    /// Recompute the whole history of these BAs.
    Rebuild(Vec<u32>),
    Shutdown,
}

/// The days one cycle computes, `[first_day, last_day)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePlan {
    pub first_day: i64,
    pub last_day: i64,
    /// `None` computes every BA.
    pub ba_ids: Option<BTreeSet<u32>>,
    /// Drop the stored availability of `ba_ids` before computing.
    pub delete_existing: bool,
}

impl CyclePlan {
    /// Start of every day in the plan.
    pub fn days(&self, timezone: Tz) -> Vec<i64> {
        let mut days = Vec::new();
        let mut day = self.first_day;
        while day < self.last_day {
            days.push(day);
            day = next_day_start(timezone, day);
        }
        days
    }
}

/// Sending side of the worker channel.
#[derive(Clone)]
pub struct AvailabilityRequests {
    tx: mpsc::UnboundedSender<WorkerMsg>,
}

impl AvailabilityRequests {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WorkerMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn wake_now(&self) -> Result<(), ReportingError> {
        self.send(WorkerMsg::WakeNow)
    }

    /// Recompute `ba_ids` from scratch; an empty list only catches up
    /// incrementally.
    pub fn rebuild(&self, ba_ids: Vec<u32>) -> Result<(), ReportingError> {
        if ba_ids.is_empty() {
            return self.wake_now();
        }
        self.send(WorkerMsg::Rebuild(ba_ids))
    }

    pub fn shutdown(&self) -> Result<(), ReportingError> {
        self.send(WorkerMsg::Shutdown)
    }

    fn send(&self, msg: WorkerMsg) -> Result<(), ReportingError> {
        self.tx.send(msg).map_err(|_| ReportingError::WorkerGone)
    }
}

/// A running worker.
pub struct SchedulerHandle {
    requests: AvailabilityRequests,
    cycles: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn requests(&self) -> AvailabilityRequests {
        self.requests.clone()
    }

    /// Counts finished cycles, successful or not.
    pub fn cycles(&self) -> watch::Receiver<u64> {
        self.cycles.clone()
    }

    /// Stop the worker once its current cycle, if any, completes.
    pub async fn shutdown(self) {
        // An already stopped worker has nothing to wait for
        let _ = self.requests.shutdown();
        if let Err(e) = self.task.await {
            error!(error = %e, "availability worker panicked");
        }
    }
}

enum Job {
    Nightly,
    Incremental,
    Rebuild(Vec<u32>),
}

#[derive(Clone)]
pub struct AvailabilityScheduler<C: Clock> {
    store: Store,
    cache: CalendarCache,
    status: StatusHandle,
    config: SchedulerConfig,
    clock: C,
}

impl<C: Clock> AvailabilityScheduler<C> {
    pub fn new(
        store: Store,
        cache: CalendarCache,
        status: StatusHandle,
        config: SchedulerConfig,
        clock: C,
    ) -> Self {
        Self { store, cache, status, config, clock }
    }

    pub fn status(&self) -> String {
        self.status.get()
    }

    /// Local midnight starting the current day.
    pub fn today(&self) -> i64 {
        day_start(self.config.timezone, self.clock.epoch_secs())
    }

    /// Yesterday, preceded by any days missed since the last stored one.
    pub fn plan_nightly(&self, tables: &ReportingTables) -> CyclePlan {
        let tz = self.config.timezone;
        let today = self.today();
        let yesterday = day_start(tz, today - 1);
        let first_day = match tables.last_availability_day() {
            Some(last) => next_day_start(tz, last).min(yesterday),
            None => yesterday,
        };
        CyclePlan { first_day, last_day: today, ba_ids: None, delete_existing: false }
    }

    /// Every day after the last stored one.
    pub fn plan_incremental(&self, tables: &ReportingTables) -> Result<CyclePlan, ReportingError> {
        let last = tables.last_availability_day().ok_or(ReportingError::NoAvailability)?;
        Ok(CyclePlan {
            first_day: next_day_start(self.config.timezone, last),
            last_day: self.today(),
            ba_ids: None,
            delete_existing: false,
        })
    }

    /// The whole event history of `ba_ids`.
    pub fn plan_rebuild(&self, tables: &ReportingTables, ba_ids: &[u32]) -> CyclePlan {
        let tz = self.config.timezone;
        let today = self.today();
        let ids: BTreeSet<u32> = ba_ids.iter().copied().collect();

        let events: Vec<&BaEvent> =
            tables.ba_events.iter().map(|(_, e)| e).filter(|e| ids.contains(&e.ba_id)).collect();
        let durations: Vec<&BaDurationEvent> =
            tables.ba_durations.iter().map(|row| &row.event).filter(|d| ids.contains(&d.ba_id)).collect();

        let first_start = events
            .iter()
            .map(|e| e.start_time)
            .chain(durations.iter().map(|d| d.real_start_time))
            .min();
        let any_open = events.iter().any(|e| e.end_time.is_none());
        let last_end = events
            .iter()
            .filter_map(|e| e.end_time)
            .chain(durations.iter().map(|d| d.end_time))
            .max();

        let (first_day, last_day) = match first_start {
            None => (today, today),
            Some(start) if any_open => (day_start(tz, start), today),
            Some(start) => {
                let end = last_end.unwrap_or(start);
                (day_start(tz, start), next_day_start(tz, end))
            }
        };
        CyclePlan { first_day, last_day, ba_ids: Some(ids), delete_existing: true }
    }

    /// Compute and store every day of `plan` in one transaction.
    ///
    /// Returns how many availability rows were written.
    pub fn run_cycle(&self, plan: &CyclePlan) -> Result<usize, ReportingError> {
        let days = plan.days(self.config.timezone);
        info!(
            first_day = plan.first_day,
            last_day = plan.last_day,
            days = days.len(),
            bas = plan.ba_ids.as_ref().map(|ids| ids.len()),
            "computing availability"
        );

        let mut txn = self.store.begin();
        if plan.delete_existing {
            if let Some(ids) = &plan.ba_ids {
                txn.push(Mutation::DeleteAvailabilities { ba_ids: ids.iter().copied().collect() });
            }
        }

        let mut written = 0;
        for (i, &day) in days.iter().enumerate() {
            self.status.set(format!("computing availability: day {}/{}", i + 1, days.len()));
            let day_end = next_day_start(self.config.timezone, day);
            let records = {
                let cache = self.cache.lock();
                compute_day(txn.tables(), &cache, plan.ba_ids.as_ref(), day, day_end)
            };
            debug!(day_start = day, rows = records.len(), "day computed");
            written += records.len();
            txn.extend(records.into_iter().map(Mutation::UpsertAvailability));
        }
        txn.commit()?;
        Ok(written)
    }

    fn plan(&self, job: &Job) -> Result<CyclePlan, ReportingError> {
        self.store.read(|tables| match job {
            Job::Nightly => Ok(self.plan_nightly(tables)),
            Job::Incremental => self.plan_incremental(tables),
            Job::Rebuild(ids) => Ok(self.plan_rebuild(tables, ids)),
        })
    }

    /// Run one job to completion. Failures are logged and left in the
    /// status string; the caller must re-request a failed rebuild.
    fn execute(&self, job: Job) {
        match self.plan(&job).and_then(|plan| self.run_cycle(&plan)) {
            Ok(rows) => {
                info!(rows, "availability cycle finished");
                self.status.clear();
            }
            Err(e) => {
                error!(error = %e, "availability cycle aborted");
                self.status.set(format!("availability failed: {e}"));
            }
        }
    }

    fn until_next_midnight(&self) -> Duration {
        let now = self.clock.epoch_secs();
        let wake_at = next_day_start(self.config.timezone, now);
        Duration::from_secs(u64::try_from(wake_at - now).unwrap_or(0))
    }

    /// Start the worker loop on the current tokio runtime.
    pub fn spawn(
        self,
        requests: AvailabilityRequests,
        rx: mpsc::UnboundedReceiver<WorkerMsg>,
    ) -> SchedulerHandle {
        let (cycles_tx, cycles) = watch::channel(0);
        let task = tokio::spawn(self.run(rx, cycles_tx));
        SchedulerHandle { requests, cycles, task }
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<WorkerMsg>, cycles: watch::Sender<u64>) {
        info!(timezone = self.config.timezone.name(), "availability worker started");
        loop {
            let job = tokio::select! {
                _ = tokio::time::sleep(self.until_next_midnight()) => Job::Nightly,
                msg = rx.recv() => match msg {
                    Some(WorkerMsg::WakeNow) => Job::Incremental,
                    Some(WorkerMsg::Rebuild(ids)) if ids.is_empty() => Job::Incremental,
                    Some(WorkerMsg::Rebuild(ids)) => Job::Rebuild(ids),
                    Some(WorkerMsg::Shutdown) | None => break,
                },
            };
            let worker = self.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || worker.execute(job)).await {
                error!(error = %e, "availability cycle panicked");
            }
            cycles.send_modify(|n| *n += 1);
        }
        info!("availability worker stopped");
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
