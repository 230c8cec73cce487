// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bam-core: events, statuses and the timeperiod calendar engine for BAM
//! reporting

pub mod macros;

pub mod clock;
pub mod event;
pub mod records;
pub mod status;
pub mod time;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
#[cfg(any(test, feature = "test-support"))]
pub use event::{BaEventBuilder, KpiEventBuilder};
pub use event::{
    BaDurationEvent, BaEvent, DimensionRecord, EntityKind, Event, KpiEvent, LifecycleEvent,
    RebuildRequest, TruncateSignal,
};
pub use records::{AvailabilityKey, AvailabilityRecord};
pub use status::BaStatus;
pub use time::{Calendar, Exception, Span, TimeError, TimeRange};
