// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status of a business activity or KPI over an event's lifetime.

use serde::{Deserialize, Serialize};

/// Monitoring state carried by BA and KPI events.
///
/// Numeric codes follow the monitoring convention (0 ok, 1 warning,
/// 2 critical, 3 unknown); anything else is treated as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaStatus {
    #[default]
    Ok,
    Warning,
    Critical,
    Unknown,
}

crate::simple_display! {
    BaStatus {
        Ok => "ok",
        Warning => "warning",
        Critical => "critical",
        Unknown => "unknown",
    }
}

impl BaStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => BaStatus::Ok,
            1 => BaStatus::Warning,
            2 => BaStatus::Critical,
            _ => BaStatus::Unknown,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            BaStatus::Ok => 0,
            BaStatus::Warning => 1,
            BaStatus::Critical => 2,
            BaStatus::Unknown => 3,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
