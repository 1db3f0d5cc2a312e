//! Deterministic drive-cycle simulation for demos and soak runs.
//!
//! The cycle position is an explicit [`SimulationState`] value: callers thread
//! it from one step to the next, one state per simulated vehicle.

use crate::telemetry::{DrivingMode, TelematicsEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ODOMETER_STEP_KM: f64 = 0.5;
const FUEL_STEP_PCT: f64 = 0.1;
const FUEL_FLOOR_PCT: f64 = 5.0;
const ENGINE_HOURS_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivePhase {
    Cruising,
    Accelerating,
    Braking,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    step: u64,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn phase(&self) -> DrivePhase {
        match self.step % 3 {
            0 => DrivePhase::Cruising,
            1 => DrivePhase::Accelerating,
            _ => DrivePhase::Braking,
        }
    }

    fn advance(self) -> Self {
        Self {
            step: self.step.wrapping_add(1),
        }
    }
}

struct PhaseReading {
    speed_kmph: f64,
    rpm: u32,
    steering_deg: f64,
    brake_pressure: f64,
    coolant_c: f64,
    oil_c: f64,
    mode: DrivingMode,
}

fn reading(phase: DrivePhase) -> PhaseReading {
    match phase {
        DrivePhase::Cruising => PhaseReading {
            speed_kmph: 65.0,
            rpm: 2100,
            steering_deg: 0.5,
            brake_pressure: 0.0,
            coolant_c: 90.0,
            oil_c: 95.0,
            mode: DrivingMode::Normal,
        },
        DrivePhase::Accelerating => PhaseReading {
            speed_kmph: 82.0,
            rpm: 3400,
            steering_deg: -2.5,
            brake_pressure: 0.0,
            coolant_c: 92.5,
            oil_c: 98.0,
            mode: DrivingMode::Sport,
        },
        DrivePhase::Braking => PhaseReading {
            speed_kmph: 45.0,
            rpm: 1500,
            steering_deg: 12.0,
            brake_pressure: 35.0,
            coolant_c: 89.0,
            oil_c: 94.0,
            mode: DrivingMode::Normal,
        },
    }
}

/// Advance one step: returns the next state and the event it produces.
/// Odometer, fuel and engine hours continue from `last`; DTCs carry over.
pub fn evolve(
    state: SimulationState,
    last: &TelematicsEvent,
    now: DateTime<Utc>,
) -> (SimulationState, TelematicsEvent) {
    let next = state.advance();
    let r = reading(next.phase());
    let event = TelematicsEvent {
        event_id: Uuid::new_v4().to_string(),
        vehicle_id: last.vehicle_id.clone(),
        timestamp: now,
        odometer_km: last.odometer_km + ODOMETER_STEP_KM,
        engine_hours: last.engine_hours + ENGINE_HOURS_STEP,
        speed_kmph: r.speed_kmph,
        accel_longitudinal: 0.0,
        brake_pedal_pressure: r.brake_pressure,
        steering_angle_deg: r.steering_deg,
        engine_coolant_temp_c: r.coolant_c,
        engine_oil_temp_c: r.oil_c,
        engine_rpm: r.rpm,
        battery_voltage_v: 13.5,
        fuel_level_pct: (last.fuel_level_pct - FUEL_STEP_PCT).max(FUEL_FLOOR_PCT),
        ambient_temp_c: last.ambient_temp_c,
        tire_pressure_fl_psi: 33.0,
        tire_pressure_fr_psi: 33.0,
        tire_pressure_rl_psi: 33.0,
        tire_pressure_rr_psi: 33.0,
        driving_mode: r.mode,
        hard_brake_events_last_10min: 0,
        harsh_accel_events_last_10min: 0,
        dtc_codes: last.dtc_codes.clone(),
    };
    (next, event)
}
