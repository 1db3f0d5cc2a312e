//! Component health models and service urgency.

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use fleet_health::features::FeatureVector;
use fleet_health::health::{
    compute_all_components, compute_battery_health, compute_brake_health, compute_engine_health,
    compute_tire_health, Component, HealthScore, HealthSummary,
};
use fleet_health::risk::RiskLevel;

fn summary(scores: Vec<HealthScore>) -> HealthSummary {
    HealthSummary {
        vehicle_id: "VH-1".into(),
        timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        component_health: scores,
    }
}

#[test]
fn brake_wear_accelerates_with_hard_braking() {
    let fv = FeatureVector {
        hard_brakes_per_100km: 5.0,
        km_since_last_brake_change: 15_000.0,
        ..FeatureVector::default()
    };
    let brake = compute_brake_health(&fv);
    assert_eq!(brake.component, Component::BrakePad);
    assert_relative_eq!(brake.health_score, 0.2, epsilon = 1e-9);
    assert_eq!(brake.risk_level, RiskLevel::High);
    assert_relative_eq!(brake.eta_km.unwrap(), 3_750.0, epsilon = 1e-6);
    assert_relative_eq!(brake.details["effective_life_km"], 18_750.0, epsilon = 1e-6);
}

#[test]
fn worn_out_brakes_clamp_to_zero() {
    let fv = FeatureVector {
        hard_brakes_per_100km: 0.0,
        km_since_last_brake_change: 45_000.0,
        ..FeatureVector::default()
    };
    let brake = compute_brake_health(&fv);
    assert_eq!(brake.health_score, 0.0);
    assert_eq!(brake.eta_km, Some(0.0));
}

#[test]
fn battery_combines_age_and_voltage() {
    let fresh = compute_battery_health(&FeatureVector::default());
    assert_relative_eq!(fresh.health_score, 1.0);
    assert_eq!(fresh.risk_level, RiskLevel::Low);
    assert_relative_eq!(fresh.eta_km.unwrap(), 60_000.0);

    let aged = compute_battery_health(&FeatureVector {
        km_since_last_battery_change: 30_000.0,
        avg_battery_voltage_v: 12.0,
        ..FeatureVector::default()
    });
    // 1 - 0.7 * 0.5 - 0.3 * 0.4
    assert_relative_eq!(aged.health_score, 0.53, epsilon = 1e-9);
    assert_eq!(aged.risk_level, RiskLevel::Medium);
    assert_relative_eq!(aged.eta_km.unwrap(), 31_800.0, epsilon = 1e-6);
}

#[test]
fn high_voltage_is_not_rewarded() {
    let hv = compute_battery_health(&FeatureVector {
        avg_battery_voltage_v: 14.2,
        ..FeatureVector::default()
    });
    assert_relative_eq!(hv.health_score, 1.0);
}

#[test]
fn tire_health_tracks_low_pressure_share() {
    let some = compute_tire_health(&FeatureVector {
        low_tire_pressure_ratio: 0.2,
        ..FeatureVector::default()
    });
    assert_relative_eq!(some.health_score, 0.7, epsilon = 1e-9);
    assert_eq!(some.risk_level, RiskLevel::Low);
    assert!(some.eta_km.is_none());

    let all = compute_tire_health(&FeatureVector {
        low_tire_pressure_ratio: 1.0,
        ..FeatureVector::default()
    });
    assert_eq!(all.health_score, 0.0);
    assert_eq!(all.risk_level, RiskLevel::High);
}

#[test]
fn engine_penalties_saturate() {
    assert_relative_eq!(compute_engine_health(&FeatureVector::default()).health_score, 1.0);

    let stressed = compute_engine_health(&FeatureVector {
        overheat_events: 10.0,
        max_coolant_temp_c: 135.0,
        dtc_count: 8.0,
        harsh_accel_braking_index: 3.0,
        ..FeatureVector::default()
    });
    assert_eq!(stressed.health_score, 0.0);
    assert_eq!(stressed.risk_level, RiskLevel::High);
}

#[test]
fn scoring_is_pure_and_bounded() {
    let fv = FeatureVector {
        hard_brakes_per_100km: 40.0,
        km_since_last_brake_change: 80_000.0,
        km_since_last_battery_change: 200_000.0,
        avg_battery_voltage_v: 9.0,
        low_tire_pressure_ratio: 2.0,
        overheat_events: 100.0,
        max_coolant_temp_c: 300.0,
        ..FeatureVector::default()
    };
    let first = compute_all_components(&fv);
    let second = compute_all_components(&fv);
    assert_eq!(first, second);

    let order: Vec<Component> = first.iter().map(|h| h.component).collect();
    assert_eq!(order, Component::ALL.to_vec());
    for h in &first {
        assert!((0.0..=1.0).contains(&h.health_score));
        assert_eq!(h.risk_level, RiskLevel::from_health_score(h.health_score));
        if let Some(km) = h.eta_km {
            assert!(km >= 0.0);
        }
    }
}

#[test]
fn risk_tier_boundaries() {
    assert_eq!(RiskLevel::from_health_score(0.29), RiskLevel::High);
    assert_eq!(RiskLevel::from_health_score(0.3), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_health_score(0.59), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_health_score(0.6), RiskLevel::Low);
}

#[test]
fn urgency_levels() {
    let low = summary(vec![HealthScore::new(Component::BrakePad, 0.9)]);
    assert_eq!(low.urgency(), RiskLevel::Low);

    let brakes = summary(vec![
        HealthScore::new(Component::BrakePad, 0.25),
        HealthScore::new(Component::Battery, 0.9),
    ]);
    assert_eq!(brakes.urgency(), RiskLevel::High);

    let battery_only = summary(vec![
        HealthScore::new(Component::BrakePad, 0.9),
        HealthScore::new(Component::Battery, 0.1),
    ]);
    assert_eq!(battery_only.urgency(), RiskLevel::Medium);

    let two_failing = summary(vec![
        HealthScore::new(Component::Battery, 0.1),
        HealthScore::new(Component::Engine, 0.15),
    ]);
    assert_eq!(two_failing.urgency(), RiskLevel::Critical);

    // two high-risk components, but mean 0.245 is not below 0.2
    let two_marginal = summary(vec![
        HealthScore::new(Component::BrakePad, 0.2),
        HealthScore::new(Component::Engine, 0.29),
    ]);
    assert_eq!(two_marginal.urgency(), RiskLevel::High);
}
