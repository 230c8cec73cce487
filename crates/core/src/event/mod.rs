// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events consumed by the reporting stream.

mod dimension;
mod lifecycle;
mod methods;

pub use dimension::{
    DimensionBa, DimensionBaBvRelation, DimensionBaTimeperiodRelation, DimensionBv, DimensionKpi,
    DimensionRecord, DimensionTimeperiod, DimensionTimeperiodException,
    DimensionTimeperiodExclusion, TruncateSignal,
};
pub use lifecycle::{BaDurationEvent, BaEvent, EntityKind, KpiEvent, LifecycleEvent};
#[cfg(any(test, feature = "test-support"))]
pub use lifecycle::{BaEventBuilder, KpiEventBuilder};
pub use methods::BAM_CATEGORY;

use serde::{Deserialize, Serialize};

/// Asks for duration events and availabilities of these BAs to be
/// recomputed from their stored history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildRequest {
    pub ba_ids: Vec<u32>,
}

/// Everything the reporting stream accepts.
///
/// Serializes with `{"type": "ba:event", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "ba:event")]
    BaEvent(BaEvent),

    #[serde(rename = "kpi:event")]
    KpiEvent(KpiEvent),

    #[serde(rename = "ba:duration")]
    BaDurationEvent(BaDurationEvent),

    #[serde(rename = "dimension:ba")]
    DimensionBa(DimensionBa),

    #[serde(rename = "dimension:bv")]
    DimensionBv(DimensionBv),

    #[serde(rename = "dimension:ba_bv_relation")]
    DimensionBaBvRelation(DimensionBaBvRelation),

    #[serde(rename = "dimension:kpi")]
    DimensionKpi(DimensionKpi),

    #[serde(rename = "dimension:truncate")]
    DimensionTruncateSignal(TruncateSignal),

    #[serde(rename = "dimension:timeperiod")]
    DimensionTimeperiod(DimensionTimeperiod),

    #[serde(rename = "dimension:ba_timeperiod_relation")]
    DimensionBaTimeperiodRelation(DimensionBaTimeperiodRelation),

    #[serde(rename = "dimension:timeperiod_exception")]
    DimensionTimeperiodException(DimensionTimeperiodException),

    #[serde(rename = "dimension:timeperiod_exclusion")]
    DimensionTimeperiodExclusion(DimensionTimeperiodExclusion),

    #[serde(rename = "rebuild")]
    Rebuild(RebuildRequest),
}

#[cfg(test)]
#[path = "methods_tests.rs"]
mod tests;
