//! Parts demand rolled up per service center.

use chrono::{TimeZone, Utc};
use fleet_health::config::DemandConfig;
use fleet_health::demand::DemandForecaster;
use fleet_health::health::{Component, HealthScore, HealthSummary};
use fleet_health::risk::RiskLevel;
use std::collections::HashMap;

fn summary(vehicle_id: &str, scores: Vec<HealthScore>) -> HealthSummary {
    HealthSummary {
        vehicle_id: vehicle_id.into(),
        timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        component_health: scores,
    }
}

fn assign(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(v, c)| (v.to_string(), c.to_string()))
        .collect()
}

#[test]
fn unknown_center_has_no_predictions() {
    let forecaster = DemandForecaster::default();
    let summaries = vec![summary("VH-1", vec![HealthScore::new(Component::BrakePad, 0.1).with_eta_days(2.0)])];
    let f = forecaster.forecast("SC-9", 30, &assign(&[("VH-1", "SC-1")]), &summaries);
    assert_eq!(f.center_id, "SC-9");
    assert_eq!(f.horizon_days, 30);
    assert!(f.predictions.is_empty());
}

#[test]
fn high_risk_component_due_soon_is_one_job() {
    let forecaster = DemandForecaster::default();
    let summaries = vec![summary("VH-1", vec![HealthScore::new(Component::BrakePad, 0.2).with_eta_days(5.0)])];
    let f = forecaster.forecast("SC-1", 30, &assign(&[("VH-1", "SC-1")]), &summaries);
    assert_eq!(f.jobs_for(Component::BrakePad), Some(1));
}

#[test]
fn eta_km_is_converted_with_daily_distance() {
    let forecaster = DemandForecaster::new(&DemandConfig {
        daily_km: 40.0,
        ..DemandConfig::default()
    });
    let summaries = vec![
        // 400 km → 10 days
        summary("VH-1", vec![HealthScore::new(Component::Battery, 0.2).with_eta_km(400.0)]),
        // 2000 km → 50 days, beyond the horizon
        summary("VH-2", vec![HealthScore::new(Component::Battery, 0.2).with_eta_km(2_000.0)]),
    ];
    let f = forecaster.forecast(
        "SC-1",
        30,
        &assign(&[("VH-1", "SC-1"), ("VH-2", "SC-1")]),
        &summaries,
    );
    assert_eq!(f.jobs_for(Component::Battery), Some(1));
}

#[test]
fn low_risk_and_unscheduled_components_are_ignored() {
    let forecaster = DemandForecaster::default();
    let mut critical = HealthScore::new(Component::Engine, 0.0).with_eta_days(1.0);
    critical.risk_level = RiskLevel::Critical;
    let summaries = vec![summary(
        "VH-1",
        vec![
            HealthScore::new(Component::BrakePad, 0.9).with_eta_days(1.0),
            HealthScore::new(Component::Tire, 0.1),
            critical,
        ],
    )];
    let f = forecaster.forecast("SC-1", 30, &assign(&[("VH-1", "SC-1")]), &summaries);
    assert!(f.predictions.is_empty());
}

#[test]
fn accumulated_weights_round_half_to_even() {
    let forecaster = DemandForecaster::default();
    let medium = |v: &str| summary(v, vec![HealthScore::new(Component::Tire, 0.4).with_eta_days(3.0)]);
    let ids = ["VH-1", "VH-2", "VH-3", "VH-4", "VH-5"];
    let summaries: Vec<HealthSummary> = ids.iter().copied().map(medium).collect();
    let assignment: HashMap<String, String> = ids
        .iter()
        .map(|v| (v.to_string(), "SC-1".to_string()))
        .collect();

    // 5 × 0.5 = 2.5 → 2
    let f = forecaster.forecast("SC-1", 30, &assignment, &summaries);
    assert_eq!(f.jobs_for(Component::Tire), Some(2));

    // 0.5 → 0, still listed
    let f = forecaster.forecast("SC-1", 30, &assignment, &summaries[..1]);
    assert_eq!(f.jobs_for(Component::Tire), Some(0));

    // 3 × 0.5 = 1.5 → 2
    let f = forecaster.forecast("SC-1", 30, &assignment, &summaries[..3]);
    assert_eq!(f.jobs_for(Component::Tire), Some(2));
}

#[test]
fn predictions_keep_first_seen_order() {
    let forecaster = DemandForecaster::default();
    let summaries = vec![
        summary("VH-1", vec![HealthScore::new(Component::Engine, 0.1).with_eta_days(2.0)]),
        summary(
            "VH-2",
            vec![
                HealthScore::new(Component::BrakePad, 0.1).with_eta_days(2.0),
                HealthScore::new(Component::Engine, 0.1).with_eta_days(2.0),
            ],
        ),
    ];
    let assignment = assign(&[("VH-1", "SC-1"), ("VH-2", "SC-1")]);
    let f = forecaster.forecast("SC-1", 30, &assignment, &summaries);
    let order: Vec<Component> = f.predictions.iter().map(|p| p.component).collect();
    assert_eq!(order, vec![Component::Engine, Component::BrakePad]);
    assert_eq!(f.jobs_for(Component::Engine), Some(2));
}

#[test]
fn forecast_all_covers_each_center() {
    let forecaster = DemandForecaster::default();
    let summaries = vec![
        summary("VH-1", vec![HealthScore::new(Component::BrakePad, 0.1).with_eta_days(2.0)]),
        summary("VH-2", vec![HealthScore::new(Component::Battery, 0.1).with_eta_days(2.0)]),
    ];
    let assignment = assign(&[("VH-1", "SC-1"), ("VH-2", "SC-2")]);
    let centers = vec!["SC-2".to_string(), "SC-1".to_string(), "SC-3".to_string()];
    let all = forecaster.forecast_all(&centers, 14, &assignment, &summaries);
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].center_id, "SC-2");
    assert_eq!(all[0].jobs_for(Component::Battery), Some(1));
    assert_eq!(all[1].jobs_for(Component::BrakePad), Some(1));
    assert!(all[2].predictions.is_empty());
}
