//! Integration test: config load, ingestion, engine run, anomaly ledger, simulation.

use chrono::{Duration, TimeZone, Utc};
use fleet_health::{
    anomaly::{AnomalyKind, AnomalyRecord, AnomalySink, MemorySink, Subject},
    config::{DemandConfig, EngineConfig},
    engine::HealthEngine,
    error::HealthError,
    health::Component,
    risk::RiskLevel,
    simulation::{evolve, DrivePhase, SimulationState},
    storage::AnomalyStore,
    telemetry::{parse_timestamp, DrivingMode, TelematicsEvent},
};
use std::path::Path;
use std::sync::Arc;

const EVENT_JSON: &str = r#"{
    "event_id": "ev-1", "vehicle_id": "VH-42", "timestamp": "2024-03-01T08:00:00",
    "odometer_km": 12000.5, "speed_kmph": 42.0, "accel_longitudinal": 0.1,
    "brake_pedal_pressure": 3.0, "steering_angle_deg": 1.0,
    "engine_coolant_temp_c": 91.0, "engine_oil_temp_c": 96.0, "engine_rpm": 1900,
    "battery_voltage_v": 12.5, "fuel_level_pct": 55.0, "ambient_temp_c": 18.0,
    "tire_pressure_fl_psi": 33.0, "tire_pressure_fr_psi": 33.0,
    "tire_pressure_rl_psi": 32.5, "tire_pressure_rr_psi": 32.5,
    "driving_mode": "CITY", "hard_brake_events_last_10min": 0,
    "harsh_accel_events_last_10min": 1, "dtc_codes": ["P0301"]
}"#;

fn record(subject: &Subject, kind: AnomalyKind, minutes_ago: i64, context: &str) -> AnomalyRecord {
    AnomalyRecord {
        id: format!("an-{minutes_ago}"),
        kind,
        severity: 6.0,
        risk_level: RiskLevel::Medium,
        context: context.into(),
        subject: subject.clone(),
        detected_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

#[test]
fn config_load_default() {
    let c = EngineConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.window.max_days, 7);
    assert_eq!(c.features.window_events, 50);
    assert_eq!(c.demand.daily_km, 40.0);
    assert!(!c.uplink.enabled);
}

#[test]
fn config_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"window": {"max_days": 3}, "fleet": {"concurrency": 8}}"#).unwrap();
    let c = EngineConfig::load(&path);
    assert_eq!(c.window.max_days, 3);
    assert_eq!(c.fleet.concurrency, 8);
    assert_eq!(c.features.trips, 5);

    std::fs::write(&path, "not json").unwrap();
    assert_eq!(EngineConfig::load(&path).window.max_days, 7);
}

#[test]
fn config_nested_sections_keep_unset_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"window": {"max_days": 3},
            "simulation": {"interval_secs": 0},
            "features": {"window_days": 2},
            "demand": {"default_center_id": "SC-7"},
            "log": {"json": false}}"#,
    )
    .unwrap();
    let c = EngineConfig::load(&path);
    assert_eq!(c.window.max_days, 3);
    assert_eq!(c.simulation.interval_secs, 0);
    assert_eq!(c.simulation.vehicle_ids, vec!["VH-1000".to_string()]);
    assert_eq!(c.features.window_days, 2);
    assert_eq!(c.features.window_km, 500.0);
    assert_eq!(c.features.window_events, 50);
    assert_eq!(c.demand.default_center_id, "SC-7");
    assert_eq!(c.demand.horizon_days, 30);
    assert!(!c.log.json);
    assert_eq!(c.log.level, "info");
}

#[test]
fn demand_assignment_falls_back_to_default_center() {
    let mut c = EngineConfig::default();
    c.demand.vehicle_centers.insert("VH-1".into(), "SC-NORTH".into());
    let assignment = c.demand.assignment(["VH-1", "VH-2"]);
    assert_eq!(assignment["VH-1"], "SC-NORTH");
    assert_eq!(assignment["VH-2"], "CENTER-01");
    assert_eq!(
        DemandConfig::center_ids(&assignment),
        vec!["CENTER-01".to_string(), "SC-NORTH".to_string()]
    );
}

#[test]
fn event_decodes_from_json() {
    let e = TelematicsEvent::from_json(EVENT_JSON).unwrap();
    assert_eq!(e.vehicle_id, "VH-42");
    assert_eq!(e.timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    assert_eq!(e.driving_mode, DrivingMode::City);
    assert!(e.dtc_codes.contains("P0301"));
    assert_eq!(e.engine_hours, 0.0);
}

#[test]
fn bad_timestamp_is_rejected() {
    let bad = EVENT_JSON.replace("2024-03-01T08:00:00", "yesterday");
    assert!(matches!(TelematicsEvent::from_json(&bad), Err(HealthError::MalformedEvent(_))));
    assert!(matches!(parse_timestamp("03/01/2024"), Err(HealthError::InvalidTimestamp { .. })));
    assert_eq!(
        parse_timestamp("2024-03-01T09:00:00+01:00").unwrap(),
        parse_timestamp("2024-03-01 08:00:00").unwrap()
    );
}

#[test]
fn ndjson_stops_at_first_bad_line() {
    let one_line = EVENT_JSON.replace('\n', " ");
    let good = format!("{one_line}\n\n{one_line}\n");
    let events = TelematicsEvent::parse_ndjson(&good).unwrap();
    assert_eq!(events.len(), 2);

    let bad_ts = one_line.replace("2024-03-01T08:00:00", "not-a-time");
    let mixed = format!("{one_line}\n\n{bad_ts}\n{one_line}\n");
    match TelematicsEvent::parse_ndjson(&mixed) {
        Err(HealthError::MalformedLine { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected MalformedLine, got {other:?}"),
    }
}

#[test]
fn process_event_rejects_foreign_vehicle() {
    let engine = HealthEngine::new(&EngineConfig::default(), Arc::new(MemorySink::new()));
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let err = engine
        .process_event("VH-1", TelematicsEvent::nominal("VH-2", t0, 100.0), &[])
        .unwrap_err();
    assert!(matches!(err, HealthError::VehicleMismatch { .. }));
    assert!(engine.windows().get_window("VH-1").is_empty());
    assert!(engine.windows().vehicle_ids().is_empty());
}

#[test]
fn component_tags_are_a_closed_set() {
    assert_eq!(
        serde_json::from_str::<Component>(r#""brake_pad""#).unwrap(),
        Component::BrakePad
    );
    assert!(serde_json::from_str::<Component>(r#""transmission""#).is_err());
}

#[test]
fn engine_process_event_scores_window() {
    let engine = HealthEngine::new(&EngineConfig::default(), Arc::new(MemorySink::new()));
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

    let first = engine
        .process_event("VH-1", TelematicsEvent::nominal("VH-1", t0 + Duration::hours(1), 5_000.0), &[])
        .unwrap();
    assert_eq!(first.component_health.len(), 4);

    // a late event does not move the summary timestamp backwards
    let second = engine
        .process_event("VH-1", TelematicsEvent::nominal("VH-1", t0, 4_990.0), &[])
        .unwrap();
    assert_eq!(second.timestamp, t0 + Duration::hours(1));
    assert_eq!(engine.windows().get_window("VH-1").len(), 2);

    let brake = second.component(Component::BrakePad).unwrap();
    assert!(brake.health_score > 0.8);
    assert_eq!(second.urgency(), RiskLevel::Low);
}

#[test]
fn analyze_batch_requires_events() {
    let engine = HealthEngine::new(&EngineConfig::default(), Arc::new(MemorySink::new()));
    assert!(matches!(engine.analyze_batch(&[], &[]), Err(HealthError::EmptyEvents)));
}

#[test]
fn storage_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anomalies.db");
    let store = AnomalyStore::open(&path, b"test-secret").unwrap();
    let vehicle = Subject::vehicle("VH-1");
    let driver = Subject::driver("DR-1");

    store
        .record_anomalies(
            &vehicle,
            &[
                record(&vehicle, AnomalyKind::HarshBrakingSpike, 10, "Harsh braking events: 31"),
                record(&vehicle, AnomalyKind::ExcessiveIdling, 5, "Idling events: 9"),
            ],
        )
        .unwrap();
    store
        .record_anomalies(&driver, &[record(&driver, AnomalyKind::DriverSpeeding, 1, "speeding")])
        .unwrap();

    let recent = store.recent(&vehicle, 10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].kind, AnomalyKind::ExcessiveIdling);
    assert_eq!(recent[0].context, "Idling events: 9");
    assert_eq!(recent[1].risk_level, RiskLevel::Medium);
    assert_eq!(recent[1].subject, vehicle);

    assert_eq!(store.recent(&vehicle, 1).unwrap().len(), 1);
    assert_eq!(store.recent(&driver, 10).unwrap().len(), 1);
}

#[test]
fn storage_context_needs_the_right_secret() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("anomalies.db");
    let vehicle = Subject::vehicle("VH-1");
    {
        let store = AnomalyStore::open(&path, b"secret-a").unwrap();
        store
            .insert(&[record(&vehicle, AnomalyKind::HarshBrakingSpike, 1, "private")])
            .unwrap();
    }
    let other = AnomalyStore::open(&path, b"secret-b").unwrap();
    assert!(other.recent(&vehicle, 10).is_err());
}

#[test]
fn storage_prune_before() {
    let dir = tempfile::tempdir().unwrap();
    let store = AnomalyStore::open(&dir.path().join("anomalies.db"), b"test-secret").unwrap();
    let vehicle = Subject::vehicle("VH-1");
    store
        .insert(&[
            record(&vehicle, AnomalyKind::HarshBrakingSpike, 60 * 24 * 100, "old"),
            record(&vehicle, AnomalyKind::HarshBrakingSpike, 1, "new"),
        ])
        .unwrap();
    let pruned = store.prune_before(Utc::now() - Duration::days(90)).unwrap();
    assert_eq!(pruned, 1);
    let left = store.recent(&vehicle, 10).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].context, "new");
}

#[test]
fn simulation_cycles_phases() {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let mut last = TelematicsEvent::nominal("VH-SIM", t0, 25_000.0);
    last.fuel_level_pct = 5.05;
    last.dtc_codes.insert("P0420".into());
    let mut state = SimulationState::new();

    let mut phases = Vec::new();
    for i in 1..=4 {
        let (next, event) = evolve(state, &last, t0 + Duration::seconds(5 * i));
        phases.push(next.phase());
        assert_eq!(event.vehicle_id, "VH-SIM");
        assert_eq!(event.odometer_km, last.odometer_km + 0.5);
        assert!(event.fuel_level_pct >= 5.0);
        assert!(event.dtc_codes.contains("P0420"));
        assert_eq!(event.battery_voltage_v, 13.5);
        state = next;
        last = event;
    }
    assert_eq!(
        phases,
        vec![
            DrivePhase::Accelerating,
            DrivePhase::Braking,
            DrivePhase::Cruising,
            DrivePhase::Accelerating
        ]
    );
    assert_eq!(state.step(), 4);
    assert_eq!(last.speed_kmph, 82.0);
    assert_eq!(last.engine_rpm, 3400);
    assert_eq!(last.driving_mode, DrivingMode::Sport);
    assert_eq!(last.fuel_level_pct, 5.0);
}
