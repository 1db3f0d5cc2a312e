//! Feature extraction pipeline: buffered events → sub-windows → window stats → vector.

use super::{FeatureVector, WindowStats};
use crate::config::FeaturesConfig;
use crate::error::{HealthError, Result};
use crate::health::Component;
use crate::telemetry::{km_since_last_replacement, MaintenanceRecord, TelematicsEvent};
use chrono::Duration;

pub struct FeatureExtractor {
    config: FeaturesConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    /// Build the feature vector for the latest state of one vehicle.
    ///
    /// Brake and battery wear come from the distance window, thermal and DTC
    /// signals from the time window.
    pub fn extract(
        &self,
        events: &[TelematicsEvent],
        history: &[MaintenanceRecord],
    ) -> Result<FeatureVector> {
        if events.is_empty() {
            return Err(HealthError::EmptyEvents);
        }

        let mut sorted: Vec<&TelematicsEvent> = events.iter().collect();
        sorted.sort_by_key(|e| e.timestamp);
        let latest_odo = sorted.last().map(|e| e.odometer_km).unwrap_or_default();

        let stats_7d = stats(&self.by_time(&sorted));
        let stats_500 = stats(&self.by_distance(&sorted));
        let stats_50 = stats(self.last_n(&sorted));

        let trips: Vec<WindowStats> = self
            .pseudo_trips(&sorted)
            .into_iter()
            .filter_map(stats)
            .collect();
        let trip_mean = |f: fn(&WindowStats) -> f64| {
            if trips.is_empty() {
                0.0
            } else {
                trips.iter().map(f).sum::<f64>() / trips.len() as f64
            }
        };

        let defaults = FeatureVector::default();
        Ok(FeatureVector {
            latest_odometer_km: latest_odo,
            hard_brakes_per_100km: stats_500
                .as_ref()
                .map_or(defaults.hard_brakes_per_100km, |s| s.hard_brakes_per_100km),
            avg_brake_pressure: stats_500.as_ref().map_or(0.0, |s| s.avg_brake_pressure),
            avg_battery_voltage_v: stats_500
                .as_ref()
                .map_or(defaults.avg_battery_voltage_v, |s| s.avg_battery_voltage_v),
            low_tire_pressure_ratio: stats_500.as_ref().map_or(0.0, |s| s.low_tire_pressure_ratio),
            w500_avg_speed_kmph: stats_500.as_ref().map_or(0.0, |s| s.avg_speed_kmph),
            overheat_events: stats_7d.as_ref().map_or(0.0, |s| s.overheat_events),
            max_coolant_temp_c: stats_7d
                .as_ref()
                .map_or(defaults.max_coolant_temp_c, |s| s.max_coolant_temp_c),
            dtc_count: stats_7d.as_ref().map_or(0.0, |s| s.dtc_count),
            harsh_accel_braking_index: stats_7d.as_ref().map_or(0.0, |s| s.harsh_index),
            w7d_avg_speed_kmph: stats_7d.as_ref().map_or(0.0, |s| s.avg_speed_kmph),
            w7d_city_ratio: stats_7d.as_ref().map_or(0.0, |s| s.city_ratio),
            w50_avg_speed_kmph: stats_50.as_ref().map_or(0.0, |s| s.avg_speed_kmph),
            trip_max_brake_pressure_avg: trip_mean(|s| s.max_brake_pressure),
            trip_harsh_index_avg: trip_mean(|s| s.harsh_index),
            km_since_last_brake_change: km_since_last_replacement(
                history,
                latest_odo,
                Component::BrakePad.as_str(),
            ),
            km_since_last_battery_change: km_since_last_replacement(
                history,
                latest_odo,
                Component::Battery.as_str(),
            ),
        })
    }

    /// Events no older than `window_days` before the latest one.
    fn by_time<'a>(&self, sorted: &[&'a TelematicsEvent]) -> Vec<&'a TelematicsEvent> {
        let Some(latest) = sorted.last() else {
            return Vec::new();
        };
        let cutoff = latest.timestamp - Duration::days(self.config.window_days);
        sorted.iter().copied().filter(|e| e.timestamp >= cutoff).collect()
    }

    /// Events within `window_km` of the highest odometer reading, ordered by odometer.
    fn by_distance<'a>(&self, sorted: &[&'a TelematicsEvent]) -> Vec<&'a TelematicsEvent> {
        let mut by_odo: Vec<&TelematicsEvent> = sorted.to_vec();
        by_odo.sort_by(|a, b| a.odometer_km.total_cmp(&b.odometer_km));
        let Some(latest) = by_odo.last() else {
            return Vec::new();
        };
        let min_odo = (latest.odometer_km - self.config.window_km).max(0.0);
        by_odo.into_iter().filter(|e| e.odometer_km >= min_odo).collect()
    }

    fn last_n<'s, 'a>(&self, sorted: &'s [&'a TelematicsEvent]) -> &'s [&'a TelematicsEvent] {
        let n = self.config.window_events;
        &sorted[sorted.len().saturating_sub(n)..]
    }

    /// Approximate trips as fixed-size contiguous blocks; keeps the last `trips`.
    ///
    /// Block size is `len / (2 * trips)`, so the kept blocks cover roughly the
    /// most recent half of the window. This is not start/stop trip detection.
    fn pseudo_trips<'s, 'a>(&self, sorted: &'s [&'a TelematicsEvent]) -> Vec<&'s [&'a TelematicsEvent]> {
        if sorted.is_empty() {
            return Vec::new();
        }
        let trips = self.config.trips;
        let block = (sorted.len() / (trips * 2).max(1)).max(1);
        let blocks: Vec<_> = sorted.chunks(block).collect();
        let skip = blocks.len().saturating_sub(trips);
        blocks.into_iter().skip(skip).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeaturesConfig::default())
    }
}

fn stats(events: &[&TelematicsEvent]) -> Option<WindowStats> {
    WindowStats::from_events(events.iter().copied())
}

/// Extract features with the default window shapes (7 days, 500 km, 50 events, 5 trips).
pub fn compute_windowed_features(
    events: &[TelematicsEvent],
    history: &[MaintenanceRecord],
) -> Result<FeatureVector> {
    FeatureExtractor::default().extract(events, history)
}
