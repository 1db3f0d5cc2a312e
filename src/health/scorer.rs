//! Deterministic component health models. Pure functions of the feature vector.

use super::{Component, HealthScore};
use crate::features::{FeatureVector, BASELINE_HARD_BRAKES_PER_100KM, NOMINAL_BATTERY_VOLTAGE_V};

const BRAKE_BASE_LIFE_KM: f64 = 30_000.0;
const BRAKE_USAGE_WEIGHT: f64 = 0.6;

const BATTERY_LIFE_KM: f64 = 60_000.0;
const BATTERY_AGE_WEIGHT: f64 = 0.7;
const BATTERY_VOLTAGE_WEIGHT: f64 = 0.3;
/// Voltage drop that costs the full voltage penalty.
const BATTERY_VOLTAGE_SPAN_V: f64 = 1.5;

const TIRE_LOW_PRESSURE_WEIGHT: f64 = 1.5;

const ENGINE_OVERHEAT_SATURATION: f64 = 5.0;
const ENGINE_DTC_SATURATION: f64 = 5.0;
const ENGINE_HARSH_SATURATION: f64 = 2.0;
const ENGINE_SAFE_COOLANT_C: f64 = 95.0;
const ENGINE_COOLANT_SPAN_C: f64 = 20.0;

/// Brake pads wear faster with frequent hard braking.
pub fn compute_brake_health(features: &FeatureVector) -> HealthScore {
    let hard_brakes = features.hard_brakes_per_100km;
    let usage_factor =
        1.0 + BRAKE_USAGE_WEIGHT * (hard_brakes / BASELINE_HARD_BRAKES_PER_100KM.max(0.1));
    let effective_life_km = BRAKE_BASE_LIFE_KM / usage_factor.max(0.1);
    let km_since_change = features.km_since_last_brake_change;

    let score = HealthScore::new(
        Component::BrakePad,
        1.0 - km_since_change / effective_life_km.max(1.0),
    );
    let eta_km = (score.health_score * effective_life_km).max(0.0);
    score
        .with_eta_km(eta_km)
        .with_detail("km_since_last_change", km_since_change)
        .with_detail("effective_life_km", effective_life_km)
        .with_detail("hard_brakes_per_100km", hard_brakes)
}

/// Battery ages with distance and shows it as a sagging resting voltage.
pub fn compute_battery_health(features: &FeatureVector) -> HealthScore {
    let avg_voltage = features.avg_battery_voltage_v;
    let km_since_change = features.km_since_last_battery_change;

    let age_factor = km_since_change / BATTERY_LIFE_KM;
    let voltage_penalty =
        ((NOMINAL_BATTERY_VOLTAGE_V - avg_voltage) / BATTERY_VOLTAGE_SPAN_V).max(0.0);

    let score = HealthScore::new(
        Component::Battery,
        1.0 - BATTERY_AGE_WEIGHT * age_factor - BATTERY_VOLTAGE_WEIGHT * voltage_penalty,
    );
    let eta_km = score.health_score.max(0.0) * BATTERY_LIFE_KM;
    score
        .with_eta_km(eta_km)
        .with_detail("km_since_last_change", km_since_change)
        .with_detail("avg_battery_voltage_v", avg_voltage)
}

pub fn compute_tire_health(features: &FeatureVector) -> HealthScore {
    let low_ratio = features.low_tire_pressure_ratio;
    HealthScore::new(Component::Tire, 1.0 - TIRE_LOW_PRESSURE_WEIGHT * low_ratio)
        .with_detail("low_tire_pressure_ratio", low_ratio)
}

/// Engine stress from overheating, fault codes and harsh driving.
pub fn compute_engine_health(features: &FeatureVector) -> HealthScore {
    let overheat_events = features.overheat_events;
    let max_coolant = features.max_coolant_temp_c;
    let dtc_count = features.dtc_count;
    let harsh_index = features.harsh_accel_braking_index;

    let overheat_penalty = (overheat_events / ENGINE_OVERHEAT_SATURATION).min(1.0);
    let temp_penalty = ((max_coolant - ENGINE_SAFE_COOLANT_C) / ENGINE_COOLANT_SPAN_C).max(0.0);
    let dtc_penalty = (dtc_count / ENGINE_DTC_SATURATION).min(1.0);
    let harsh_penalty = (harsh_index / ENGINE_HARSH_SATURATION).min(1.0);

    let score = 1.0
        - 0.4 * overheat_penalty
        - 0.2 * temp_penalty
        - 0.2 * dtc_penalty
        - 0.2 * harsh_penalty;

    HealthScore::new(Component::Engine, score)
        .with_detail("overheat_events", overheat_events)
        .with_detail("max_coolant_temp_c", max_coolant)
        .with_detail("dtc_count", dtc_count)
        .with_detail("harsh_index", harsh_index)
}

/// All components in fixed order: brake pad, battery, tire, engine.
pub fn compute_all_components(features: &FeatureVector) -> Vec<HealthScore> {
    vec![
        compute_brake_health(features),
        compute_battery_health(features),
        compute_tire_health(features),
        compute_engine_health(features),
    ]
}
