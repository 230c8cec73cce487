// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bam_core::TimeError;
use bam_storage::StoreError;
use thiserror::Error;

/// Calendar cache lookups and updates that contradict the stored
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("BA {ba_id} is related to unknown timeperiod {timeperiod_id}")]
    DanglingRelation { ba_id: u32, timeperiod_id: u32 },
    #[error("unknown timeperiod {0}")]
    UnknownTimeperiod(u32),
    #[error("invalid timeperiod {timeperiod_id}: {source}")]
    InvalidTimeperiod { timeperiod_id: u32, source: TimeError },
}

#[derive(Debug, Error)]
pub enum ReportingError {
    #[error("configuration inconsistency: {0}")]
    ConfigInconsistency(#[from] CacheError),
    #[error("no availability has been computed yet; request a rebuild first")]
    NoAvailability,
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("availability worker has stopped")]
    WorkerGone,
}
