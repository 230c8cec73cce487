// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for `Event` methods and wire shape.

use super::*;
use crate::status::BaStatus;
use std::collections::HashSet;

fn ba_event(end_time: Option<i64>) -> Event {
    Event::BaEvent(BaEvent {
        ba_id: 7,
        start_time: 100,
        end_time,
        status: BaStatus::Critical,
        in_downtime: false,
        first_level: 42.0,
    })
}

fn all_events() -> Vec<Event> {
    vec![
        ba_event(None),
        Event::KpiEvent(KpiEvent {
            kpi_id: 3,
            start_time: 10,
            end_time: Some(20),
            status: BaStatus::Ok,
            in_downtime: false,
            impact_level: 0,
            output: String::new(),
            perfdata: String::new(),
        }),
        Event::BaDurationEvent(BaDurationEvent {
            ba_id: 1,
            real_start_time: 0,
            start_time: 0,
            end_time: 30,
            duration: 30,
            sla_duration: 30,
            timeperiod_id: 1,
            timeperiod_is_default: true,
        }),
        Event::DimensionBa(DimensionBa {
            ba_id: 1,
            name: "web".into(),
            description: String::new(),
            sla_month_percent_crit: 90.0,
            sla_month_percent_warn: 95.0,
            sla_month_duration_crit: 0,
            sla_month_duration_warn: 0,
        }),
        Event::DimensionBv(DimensionBv { bv_id: 2, name: "ops".into(), description: String::new() }),
        Event::DimensionBaBvRelation(DimensionBaBvRelation { ba_id: 1, bv_id: 2 }),
        Event::DimensionKpi(DimensionKpi { kpi_id: 3, ba_id: 1, ..Default::default() }),
        Event::DimensionTruncateSignal(TruncateSignal { update_started: true }),
        Event::DimensionTimeperiod(DimensionTimeperiod { timeperiod_id: 1, ..Default::default() }),
        Event::DimensionBaTimeperiodRelation(DimensionBaTimeperiodRelation {
            ba_id: 1,
            timeperiod_id: 1,
            is_default: true,
        }),
        Event::DimensionTimeperiodException(DimensionTimeperiodException {
            timeperiod_id: 1,
            daterange: "december 25".into(),
            timerange: String::new(),
        }),
        Event::DimensionTimeperiodExclusion(DimensionTimeperiodExclusion {
            timeperiod_id: 1,
            excluded_timeperiod_id: 2,
        }),
        Event::Rebuild(RebuildRequest { ba_ids: vec![1, 2] }),
    ]
}

#[test]
fn type_ids_are_unique_and_in_bam_category() {
    let events = all_events();
    let ids: HashSet<u32> = events.iter().map(Event::type_id).collect();
    assert_eq!(ids.len(), events.len());
    for event in &events {
        assert_eq!(event.type_id() >> 16, BAM_CATEGORY, "{}", event.name());
    }
}

#[yare::parameterized(
    ba_event   = { 0, 0x6_0005 },
    truncate   = { 7, 0x6_000c },
    rebuild    = { 12, 0x6_000d },
)]
fn type_id_values(index: usize, expected: u32) {
    assert_eq!(all_events()[index].type_id(), expected);
}

#[test]
fn serde_tag_matches_name() {
    for event in all_events() {
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.name());
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}

#[test]
fn open_ba_event_parses_without_end_time() {
    let json = r#"{"type":"ba:event","ba_id":1,"start_time":0,"status":"warning"}"#;
    let event: Event = serde_json::from_str(json).unwrap();
    let Event::BaEvent(ba) = event else { panic!("expected ba event") };
    assert!(ba.is_open());
    assert_eq!(ba.status, BaStatus::Warning);
}

#[test]
fn unknown_type_is_rejected() {
    assert!(serde_json::from_str::<Event>(r#"{"type":"host:status"}"#).is_err());
}

#[yare::parameterized(
    open   = { None, "ba:event ba=7 start=100 end=open status=critical" },
    closed = { Some(160), "ba:event ba=7 start=100 end=160 status=critical" },
)]
fn ba_event_log_summary(end_time: Option<i64>, expected: &str) {
    assert_eq!(ba_event(end_time).log_summary(), expected);
}

#[test]
fn only_dimension_rows_convert() {
    let rows = all_events().iter().filter_map(Event::as_dimension).count();
    assert_eq!(rows, 8);
    let kpi = Event::DimensionKpi(DimensionKpi { kpi_id: 3, ..Default::default() });
    assert_eq!(kpi.as_dimension().map(|d| d.table()), Some("kpi"));
}

#[yare::parameterized(
    service = { "svc", "ba", "bool", "meta", "svc" },
    ba      = { "", "ba", "bool", "meta", "ba" },
    boolean = { "", "", "bool", "meta", "bool" },
    meta    = { "", "", "", "meta", "meta" },
    none    = { "", "", "", "", "" },
)]
fn kpi_name_fallback(service: &str, ba: &str, boolean: &str, meta: &str, expected: &str) {
    let kpi = DimensionKpi {
        service_description: service.into(),
        kpi_ba_name: ba.into(),
        boolean_name: boolean.into(),
        meta_service_name: meta.into(),
        ..Default::default()
    };
    assert_eq!(kpi.kpi_name(), expected);
}

#[test]
fn timeperiod_dimension_builds_calendar() {
    let tp = DimensionTimeperiod {
        timeperiod_id: 4,
        name: "office".into(),
        timezone: "Europe/Paris".into(),
        monday: "09:00-17:00".into(),
        ..Default::default()
    };
    let calendar = tp.to_calendar().unwrap();
    assert_eq!(calendar.id(), 4);
    assert_eq!(calendar.timezone(), chrono_tz::Europe::Paris);

    let broken = DimensionTimeperiod { monday: "9-5".into(), ..tp };
    assert!(broken.to_calendar().is_err());
}

#[test]
fn ephemeral_and_same_state() {
    let Event::BaEvent(mut a) = ba_event(Some(100)) else { unreachable!() };
    assert!(a.is_ephemeral());
    a.set_end_time(Some(150));
    let mut b = a.clone();
    assert!(a.same_state(&b));
    b.in_downtime = true;
    assert!(!a.same_state(&b));
}
