//! Telemetry and maintenance input types.
//! Produced by external sensor and service-history collaborators; read-only here.

mod maintenance;
mod timestamp;

pub use maintenance::{km_since_last_replacement, MaintenanceRecord, ReplacedPart};
pub use timestamp::{parse_timestamp, serde_ts};

use crate::error::{HealthError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Tire pressure below which a reading counts as under-inflated (psi).
pub const LOW_TIRE_PRESSURE_PSI: f64 = 30.0;

/// Driving-mode tag reported by the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrivingMode {
    #[serde(alias = "CITY")]
    City,
    #[serde(alias = "HIGHWAY")]
    Highway,
    #[serde(alias = "MIXED")]
    Mixed,
    #[serde(alias = "NORMAL")]
    Normal,
    #[serde(alias = "SPORT")]
    Sport,
}

/// One telemetry snapshot from a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelematicsEvent {
    pub event_id: String,
    pub vehicle_id: String,
    #[serde(with = "serde_ts")]
    pub timestamp: DateTime<Utc>,
    pub odometer_km: f64,
    #[serde(default)]
    pub engine_hours: f64,
    pub speed_kmph: f64,
    pub accel_longitudinal: f64,
    pub brake_pedal_pressure: f64,
    pub steering_angle_deg: f64,
    pub engine_coolant_temp_c: f64,
    pub engine_oil_temp_c: f64,
    pub engine_rpm: u32,
    pub battery_voltage_v: f64,
    pub fuel_level_pct: f64,
    pub ambient_temp_c: f64,
    pub tire_pressure_fl_psi: f64,
    pub tire_pressure_fr_psi: f64,
    pub tire_pressure_rl_psi: f64,
    pub tire_pressure_rr_psi: f64,
    pub driving_mode: DrivingMode,
    pub hard_brake_events_last_10min: u32,
    pub harsh_accel_events_last_10min: u32,
    #[serde(default)]
    pub dtc_codes: BTreeSet<String>,
}

impl TelematicsEvent {
    /// Steady city cruise reading with nominal sensor values.
    pub fn nominal(vehicle_id: impl Into<String>, timestamp: DateTime<Utc>, odometer_km: f64) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            vehicle_id: vehicle_id.into(),
            timestamp,
            odometer_km,
            engine_hours: 100.0 + odometer_km / 40.0,
            speed_kmph: 50.0,
            accel_longitudinal: 0.0,
            brake_pedal_pressure: 0.0,
            steering_angle_deg: 0.0,
            engine_coolant_temp_c: 90.0,
            engine_oil_temp_c: 95.0,
            engine_rpm: 2000,
            battery_voltage_v: 12.6,
            fuel_level_pct: 60.0,
            ambient_temp_c: 25.0,
            tire_pressure_fl_psi: 33.0,
            tire_pressure_fr_psi: 33.0,
            tire_pressure_rl_psi: 33.0,
            tire_pressure_rr_psi: 33.0,
            driving_mode: DrivingMode::City,
            hard_brake_events_last_10min: 0,
            harsh_accel_events_last_10min: 0,
            dtc_codes: BTreeSet::new(),
        }
    }

    /// Decode one JSON record; bad timestamps and missing fields are input errors.
    pub fn from_json(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Decode newline-delimited records, skipping blank lines.
    /// Stops at the first bad record.
    pub fn parse_ndjson(input: &str) -> Result<Vec<Self>> {
        input
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| {
                serde_json::from_str(l).map_err(|source| HealthError::MalformedLine { line: i + 1, source })
            })
            .collect()
    }

    pub fn any_tire_below(&self, psi: f64) -> bool {
        [
            self.tire_pressure_fl_psi,
            self.tire_pressure_fr_psi,
            self.tire_pressure_rl_psi,
            self.tire_pressure_rr_psi,
        ]
        .iter()
        .any(|p| *p < psi)
    }

    /// Vehicle moving below walking pace with the engine turning.
    pub fn is_idling(&self) -> bool {
        self.speed_kmph < 5.0 && self.engine_rpm > 0
    }
}
