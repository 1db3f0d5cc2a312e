//! Fleet runner: per-vehicle isolation and fleet summary.

use chrono::{Duration, TimeZone, Utc};
use fleet_health::anomaly::MemorySink;
use fleet_health::config::{EngineConfig, FleetConfig};
use fleet_health::engine::HealthEngine;
use fleet_health::fleet::{FleetRunner, VehicleBatch};
use fleet_health::health::Component;
use fleet_health::risk::RiskLevel;
use fleet_health::telemetry::TelematicsEvent;
use std::sync::Arc;

fn batch(vehicle_id: &str, odometer_km: f64, n: usize) -> VehicleBatch {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    VehicleBatch {
        vehicle_id: vehicle_id.into(),
        driver_id: Some(format!("DR-{vehicle_id}")),
        events: (0..n)
            .map(|i| TelematicsEvent::nominal(vehicle_id, t0 + Duration::minutes(i as i64), odometer_km + i as f64))
            .collect(),
        maintenance: Vec::new(),
    }
}

#[tokio::test]
async fn failing_vehicle_does_not_abort_fleet() {
    let sink = Arc::new(MemorySink::new());
    let engine = Arc::new(HealthEngine::new(&EngineConfig::default(), sink.clone()));
    let runner = FleetRunner::new(engine, &FleetConfig { concurrency: 2 });

    let report = runner
        .process_fleet(vec![
            batch("VH-OK", 1_000.0, 20),
            batch("VH-EMPTY", 0.0, 0),
            batch("VH-WORN", 90_000.0, 20),
        ])
        .await;

    assert_eq!(report.total_vehicles, 3);
    assert_eq!(report.processed_ok(), 2);
    assert!(report.failed.contains_key("VH-EMPTY"));

    let ok = &report.outcomes["VH-OK"];
    assert_eq!(ok.urgency, RiskLevel::Low);
    assert!(ok.vehicle_anomalies.anomalies.is_empty());
    assert_eq!(ok.driver_anomalies.as_ref().map(|d| d.safety_score), Some(10.0));

    // brakes and battery both exhausted at 90,000 km with no service history
    let worn = &report.outcomes["VH-WORN"];
    assert_eq!(worn.urgency, RiskLevel::Critical);
    assert_eq!(worn.vehicle_anomalies.overall_risk, RiskLevel::Critical);
    assert_eq!(report.critical_count, 1);
    assert_eq!(report.high_urgency_count, 0);
    assert_eq!(
        report.top_failing_parts,
        vec![(Component::BrakePad, 1), (Component::Battery, 1)]
    );
    assert_eq!(sink.calls(), 1);
}

#[tokio::test]
async fn empty_fleet_reports_nothing() {
    let engine = Arc::new(HealthEngine::new(&EngineConfig::default(), Arc::new(MemorySink::new())));
    let runner = FleetRunner::new(engine, &FleetConfig { concurrency: 0 });
    let report = runner.process_fleet(Vec::new()).await;
    assert_eq!(report.total_vehicles, 0);
    assert!(report.outcomes.is_empty());
    assert!(report.top_failing_parts.is_empty());
}
