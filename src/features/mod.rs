//! Multi-window feature extraction from buffered telemetry and service history.

mod pipeline;
mod stats;

pub use pipeline::{compute_windowed_features, FeatureExtractor};
pub use stats::{WindowStats, OVERHEAT_COOLANT_C};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hard-brake rate assumed when none was observed (per 100 km).
pub const BASELINE_HARD_BRAKES_PER_100KM: f64 = 5.0;
/// Resting voltage of a healthy 12 V battery.
pub const NOMINAL_BATTERY_VOLTAGE_V: f64 = 12.6;
/// Coolant temperature assumed when none was observed (°C).
pub const NOMINAL_COOLANT_TEMP_C: f64 = 90.0;

/// Named features for one evaluation.
///
/// Fields absent from a deserialized vector take neutral values (see [`Default`]),
/// so partial vectors score as a healthy vehicle on the missing dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureVector {
    pub latest_odometer_km: f64,
    // 500 km window
    pub hard_brakes_per_100km: f64,
    pub avg_brake_pressure: f64,
    pub avg_battery_voltage_v: f64,
    pub low_tire_pressure_ratio: f64,
    pub w500_avg_speed_kmph: f64,
    // 7 day window
    pub overheat_events: f64,
    pub max_coolant_temp_c: f64,
    pub dtc_count: f64,
    pub harsh_accel_braking_index: f64,
    pub w7d_avg_speed_kmph: f64,
    pub w7d_city_ratio: f64,
    // last N events
    pub w50_avg_speed_kmph: f64,
    // pseudo-trips
    pub trip_max_brake_pressure_avg: f64,
    pub trip_harsh_index_avg: f64,
    // service history
    pub km_since_last_brake_change: f64,
    pub km_since_last_battery_change: f64,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            latest_odometer_km: 0.0,
            hard_brakes_per_100km: BASELINE_HARD_BRAKES_PER_100KM,
            avg_brake_pressure: 0.0,
            avg_battery_voltage_v: NOMINAL_BATTERY_VOLTAGE_V,
            low_tire_pressure_ratio: 0.0,
            w500_avg_speed_kmph: 0.0,
            overheat_events: 0.0,
            max_coolant_temp_c: NOMINAL_COOLANT_TEMP_C,
            dtc_count: 0.0,
            harsh_accel_braking_index: 0.0,
            w7d_avg_speed_kmph: 0.0,
            w7d_city_ratio: 0.0,
            w50_avg_speed_kmph: 0.0,
            trip_max_brake_pressure_avg: 0.0,
            trip_harsh_index_avg: 0.0,
            km_since_last_brake_change: 0.0,
            km_since_last_battery_change: 0.0,
        }
    }
}

impl FeatureVector {
    /// Name → value view for logging and explainability.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("latest_odometer_km", self.latest_odometer_km),
            ("hard_brakes_per_100km", self.hard_brakes_per_100km),
            ("avg_brake_pressure", self.avg_brake_pressure),
            ("avg_battery_voltage_v", self.avg_battery_voltage_v),
            ("low_tire_pressure_ratio", self.low_tire_pressure_ratio),
            ("w500_avg_speed_kmph", self.w500_avg_speed_kmph),
            ("overheat_events", self.overheat_events),
            ("max_coolant_temp_c", self.max_coolant_temp_c),
            ("dtc_count", self.dtc_count),
            ("harsh_accel_braking_index", self.harsh_accel_braking_index),
            ("w7d_avg_speed_kmph", self.w7d_avg_speed_kmph),
            ("w7d_city_ratio", self.w7d_city_ratio),
            ("w50_avg_speed_kmph", self.w50_avg_speed_kmph),
            ("trip_max_brake_pressure_avg", self.trip_max_brake_pressure_avg),
            ("trip_harsh_index_avg", self.trip_harsh_index_avg),
            ("km_since_last_brake_change", self.km_since_last_brake_change),
            ("km_since_last_battery_change", self.km_since_last_battery_change),
        ])
    }
}
