// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-day availability statistics and the worker that computes them.

mod builder;
mod compute;
mod scheduler;

pub use builder::AvailabilityBuilder;
pub use scheduler::{
    AvailabilityRequests, AvailabilityScheduler, CyclePlan, SchedulerConfig, SchedulerHandle,
    WorkerMsg,
};
