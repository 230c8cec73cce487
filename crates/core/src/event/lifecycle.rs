// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Open/close event payloads for BAs and KPIs.

use crate::status::BaStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Which ledger an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Ba,
    Kpi,
}

crate::simple_display! {
    EntityKind { Ba => "ba", Kpi => "kpi" }
}

/// Shared shape of BA and KPI events: one row per state span of an entity,
/// open while `end_time` is `None`.
pub trait LifecycleEvent: Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn entity_id(&self) -> u32;
    fn start_time(&self) -> i64;
    fn end_time(&self) -> Option<i64>;
    fn set_end_time(&mut self, end_time: Option<i64>);
    fn status(&self) -> BaStatus;
    fn in_downtime(&self) -> bool;

    fn is_open(&self) -> bool {
        self.end_time().is_none()
    }

    /// A closed span of zero length.
    fn is_ephemeral(&self) -> bool {
        self.end_time() == Some(self.start_time())
    }

    /// Same status and downtime flag, so `other` can continue this span.
    fn same_state(&self, other: &Self) -> bool {
        self.status() == other.status() && self.in_downtime() == other.in_downtime()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaEvent {
    pub ba_id: u32,
    pub start_time: i64,
    #[serde(default)]
    pub end_time: Option<i64>,
    pub status: BaStatus,
    #[serde(default)]
    pub in_downtime: bool,
    #[serde(default)]
    pub first_level: f64,
}

impl LifecycleEvent for BaEvent {
    const KIND: EntityKind = EntityKind::Ba;

    fn entity_id(&self) -> u32 {
        self.ba_id
    }
    fn start_time(&self) -> i64 {
        self.start_time
    }
    fn end_time(&self) -> Option<i64> {
        self.end_time
    }
    fn set_end_time(&mut self, end_time: Option<i64>) {
        self.end_time = end_time;
    }
    fn status(&self) -> BaStatus {
        self.status
    }
    fn in_downtime(&self) -> bool {
        self.in_downtime
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiEvent {
    pub kpi_id: u32,
    pub start_time: i64,
    #[serde(default)]
    pub end_time: Option<i64>,
    pub status: BaStatus,
    #[serde(default)]
    pub in_downtime: bool,
    #[serde(default)]
    pub impact_level: i32,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub perfdata: String,
}

impl LifecycleEvent for KpiEvent {
    const KIND: EntityKind = EntityKind::Kpi;

    fn entity_id(&self) -> u32 {
        self.kpi_id
    }
    fn start_time(&self) -> i64 {
        self.start_time
    }
    fn end_time(&self) -> Option<i64> {
        self.end_time
    }
    fn set_end_time(&mut self, end_time: Option<i64>) {
        self.end_time = end_time;
    }
    fn status(&self) -> BaStatus {
        self.status
    }
    fn in_downtime(&self) -> bool {
        self.in_downtime
    }
}

/// The part of a closed BA event that falls inside one timeperiod.
///
/// `real_start_time` is the owning event's start; `start_time` is the first
/// instant the timeperiod was open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaDurationEvent {
    pub ba_id: u32,
    pub real_start_time: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub duration: i64,
    pub sla_duration: u64,
    pub timeperiod_id: u32,
    #[serde(default)]
    pub timeperiod_is_default: bool,
}

crate::builder! {
    pub struct BaEventBuilder => BaEvent {
        ba_id: u32 = 1,
        start_time: i64 = 0,
        end_time: Option<i64> = None,
        status: BaStatus = BaStatus::Ok,
        in_downtime: bool = false,
        first_level: f64 = 100.0,
    }
}

crate::builder! {
    pub struct KpiEventBuilder => KpiEvent {
        kpi_id: u32 = 1,
        start_time: i64 = 0,
        end_time: Option<i64> = None,
        status: BaStatus = BaStatus::Ok,
        in_downtime: bool = false,
        impact_level: i32 = 0,
        output: String = String::new(),
        perfdata: String = String::new(),
    }
}
