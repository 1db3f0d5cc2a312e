//! Aggregate statistics over one sub-window of events.

use crate::telemetry::{DrivingMode, TelematicsEvent, LOW_TIRE_PRESSURE_PSI};
use serde::{Deserialize, Serialize};

/// Coolant temperature above which a reading counts as an overheat (°C).
pub const OVERHEAT_COOLANT_C: f64 = 105.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub event_count: usize,
    pub avg_speed_kmph: f64,
    pub avg_brake_pressure: f64,
    pub avg_coolant_temp_c: f64,
    pub avg_oil_temp_c: f64,
    pub avg_rpm: f64,
    pub avg_battery_voltage_v: f64,
    pub max_brake_pressure: f64,
    pub max_coolant_temp_c: f64,
    pub max_rpm: f64,
    /// Hard brakes normalised by distance covered, floor 1 km
    pub hard_brakes_per_100km: f64,
    pub city_ratio: f64,
    pub overheat_events: f64,
    /// Share of readings with any tire under 30 psi
    pub low_tire_pressure_ratio: f64,
    /// (hard brakes + harsh accels) per event
    pub harsh_index: f64,
    pub dtc_count: f64,
}

impl WindowStats {
    /// `None` for an empty window. Distance is measured between the first and
    /// last event in the order given.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a TelematicsEvent>) -> Option<Self> {
        let mut events = events.into_iter().peekable();
        let first_odo = events.peek()?.odometer_km;
        let mut last_odo = first_odo;

        let mut s = WindowStats {
            max_brake_pressure: f64::NEG_INFINITY,
            max_coolant_temp_c: f64::NEG_INFINITY,
            max_rpm: f64::NEG_INFINITY,
            ..Default::default()
        };
        let mut hard_brakes = 0u64;
        let mut harsh_accels = 0u64;
        let mut city = 0u32;
        let mut low_tire = 0u32;

        for e in events {
            s.event_count += 1;
            last_odo = e.odometer_km;
            s.avg_speed_kmph += e.speed_kmph;
            s.avg_brake_pressure += e.brake_pedal_pressure;
            s.avg_coolant_temp_c += e.engine_coolant_temp_c;
            s.avg_oil_temp_c += e.engine_oil_temp_c;
            s.avg_rpm += f64::from(e.engine_rpm);
            s.avg_battery_voltage_v += e.battery_voltage_v;

            s.max_brake_pressure = s.max_brake_pressure.max(e.brake_pedal_pressure);
            s.max_coolant_temp_c = s.max_coolant_temp_c.max(e.engine_coolant_temp_c);
            s.max_rpm = s.max_rpm.max(f64::from(e.engine_rpm));

            hard_brakes += u64::from(e.hard_brake_events_last_10min);
            harsh_accels += u64::from(e.harsh_accel_events_last_10min);
            s.dtc_count += e.dtc_codes.len() as f64;

            if e.driving_mode == DrivingMode::City {
                city += 1;
            }
            if e.engine_coolant_temp_c > OVERHEAT_COOLANT_C {
                s.overheat_events += 1.0;
            }
            if e.any_tire_below(LOW_TIRE_PRESSURE_PSI) {
                low_tire += 1;
            }
        }

        let n = s.event_count as f64;
        s.avg_speed_kmph /= n;
        s.avg_brake_pressure /= n;
        s.avg_coolant_temp_c /= n;
        s.avg_oil_temp_c /= n;
        s.avg_rpm /= n;
        s.avg_battery_voltage_v /= n;

        let km_covered = (last_odo - first_odo).max(1.0);
        s.hard_brakes_per_100km = hard_brakes as f64 / km_covered * 100.0;
        s.city_ratio = f64::from(city) / n;
        s.low_tire_pressure_ratio = f64::from(low_tire) / n;
        s.harsh_index = (hard_brakes + harsh_accels) as f64 / n;
        Some(s)
    }
}
