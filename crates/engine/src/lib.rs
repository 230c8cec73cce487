// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bam-engine: event ledger, dimension swaps, calendar cache and the
//! availability worker

pub mod availability;
mod cache;
mod dimensions;
mod error;
mod ledger;
mod status;
mod stream;

pub use availability::{
    AvailabilityBuilder, AvailabilityRequests, AvailabilityScheduler, CyclePlan, SchedulerConfig,
    SchedulerHandle, WorkerMsg,
};
pub use cache::{CacheState, CalendarCache};
pub use dimensions::DimensionSwapper;
pub use error::{CacheError, ReportingError};
pub use ledger::{EventLedger, ReconcilePolicy};
pub use status::StatusHandle;
pub use stream::{ReportingStream, StreamConfig};
