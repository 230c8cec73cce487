// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bam-storage: reporting tables with journaled, all-or-nothing commits

mod mutation;
mod snapshot;
mod store;
mod tables;
mod wal;

pub use mutation::{EventRow, Mutation, RowOp};
pub use snapshot::{load_snapshot, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use store::{Store, StoreError, Transaction};
pub use tables::{DimensionTables, DurationRow, EventTable, ReportingTables};
pub use wal::{Wal, WalEntry, WalError};
