// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference data carried by configuration dumps.

use crate::time::{parse_timezone, Calendar, Exception, TimeError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionBa {
    pub ba_id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sla_month_percent_crit: f64,
    #[serde(default)]
    pub sla_month_percent_warn: f64,
    #[serde(default)]
    pub sla_month_duration_crit: u32,
    #[serde(default)]
    pub sla_month_duration_warn: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionBv {
    pub bv_id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionBaBvRelation {
    pub ba_id: u32,
    pub bv_id: u32,
}

/// A KPI and what it watches. Exactly one of the host/service,
/// BA, meta-service or boolean-rule groups is normally filled in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionKpi {
    pub kpi_id: u32,
    pub ba_id: u32,
    pub ba_name: String,
    pub host_id: u32,
    pub host_name: String,
    pub service_id: u32,
    pub service_description: String,
    pub kpi_ba_id: u32,
    pub kpi_ba_name: String,
    pub meta_service_id: u32,
    pub meta_service_name: String,
    pub boolean_id: u32,
    pub boolean_name: String,
    pub impact_warning: f64,
    pub impact_critical: f64,
    pub impact_unknown: f64,
}

impl DimensionKpi {
    /// Display name: the first non-empty of service, BA, boolean rule and
    /// meta-service names.
    pub fn kpi_name(&self) -> &str {
        [&self.service_description, &self.kpi_ba_name, &self.boolean_name, &self.meta_service_name]
            .into_iter()
            .find(|name| !name.is_empty())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// A timeperiod's weekly schedule, one `HH:MM-HH:MM,...` string per day.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionTimeperiod {
    pub timeperiod_id: u32,
    pub name: String,
    /// IANA name; empty is UTC.
    pub timezone: String,
    pub sunday: String,
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
}

impl DimensionTimeperiod {
    /// Build the calendar, without exceptions or exclusions.
    pub fn to_calendar(&self) -> Result<Calendar, TimeError> {
        let days = [
            self.sunday.as_str(),
            self.monday.as_str(),
            self.tuesday.as_str(),
            self.wednesday.as_str(),
            self.thursday.as_str(),
            self.friday.as_str(),
            self.saturday.as_str(),
        ];
        let mut calendar = Calendar::from_weekly(self.timeperiod_id, self.name.clone(), days)?;
        calendar.set_timezone(parse_timezone(&self.timezone)?);
        Ok(calendar)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionTimeperiodException {
    pub timeperiod_id: u32,
    pub daterange: String,
    #[serde(default)]
    pub timerange: String,
}

impl DimensionTimeperiodException {
    pub fn to_exception(&self) -> Result<Exception, TimeError> {
        Exception::parse(&self.daterange, &self.timerange)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionTimeperiodExclusion {
    pub timeperiod_id: u32,
    pub excluded_timeperiod_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionBaTimeperiodRelation {
    pub ba_id: u32,
    pub timeperiod_id: u32,
    #[serde(default)]
    pub is_default: bool,
}

/// Marks the start (`update_started`) or end of a configuration dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncateSignal {
    pub update_started: bool,
}

/// Any dimension row, as buffered during a dump and stored afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum DimensionRecord {
    Ba(DimensionBa),
    Bv(DimensionBv),
    BaBvRelation(DimensionBaBvRelation),
    Kpi(DimensionKpi),
    Timeperiod(DimensionTimeperiod),
    TimeperiodException(DimensionTimeperiodException),
    TimeperiodExclusion(DimensionTimeperiodExclusion),
    BaTimeperiodRelation(DimensionBaTimeperiodRelation),
}

impl DimensionRecord {
    pub fn table(&self) -> &'static str {
        match self {
            DimensionRecord::Ba(_) => "ba",
            DimensionRecord::Bv(_) => "bv",
            DimensionRecord::BaBvRelation(_) => "ba_bv_relation",
            DimensionRecord::Kpi(_) => "kpi",
            DimensionRecord::Timeperiod(_) => "timeperiod",
            DimensionRecord::TimeperiodException(_) => "timeperiod_exception",
            DimensionRecord::TimeperiodExclusion(_) => "timeperiod_exclusion",
            DimensionRecord::BaTimeperiodRelation(_) => "ba_timeperiod_relation",
        }
    }
}
