//! Engine facade: window store → features → health scores, plus anomaly
//! detection and demand forecasting over the results.

use crate::anomaly::{AnomalyDetector, AnomalySink, DriverAnomalyReport, VehicleAnomalyReport};
use crate::config::EngineConfig;
use crate::demand::{DemandForecast, DemandForecaster};
use crate::error::{HealthError, Result};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::health::{compute_all_components, HealthSummary};
use crate::telemetry::{MaintenanceRecord, TelematicsEvent};
use crate::window::WindowStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct HealthEngine {
    windows: WindowStore,
    extractor: FeatureExtractor,
    detector: AnomalyDetector,
    forecaster: DemandForecaster,
}

impl HealthEngine {
    pub fn new(config: &EngineConfig, sink: Arc<dyn AnomalySink>) -> Self {
        Self {
            windows: WindowStore::new(&config.window),
            extractor: FeatureExtractor::new(config.features.clone()),
            detector: AnomalyDetector::new(sink),
            forecaster: DemandForecaster::new(&config.demand),
        }
    }

    pub fn windows(&self) -> &WindowStore {
        &self.windows
    }

    /// Buffer one event and rescore the vehicle from its whole window.
    ///
    /// The summary is stamped with the newest buffered timestamp, so a late
    /// event never moves the vehicle's state backwards.
    pub fn process_event(
        &self,
        vehicle_id: &str,
        event: TelematicsEvent,
        maintenance: &[MaintenanceRecord],
    ) -> Result<HealthSummary> {
        if event.vehicle_id != vehicle_id {
            return Err(HealthError::VehicleMismatch {
                expected: vehicle_id.to_string(),
                found: event.vehicle_id,
            });
        }
        let window = self.windows.add_event(vehicle_id, event);
        let newest = window.last().map(|e| e.timestamp).ok_or(HealthError::EmptyEvents)?;
        let features = self.extractor.extract(&window, maintenance)?;
        let summary = score(vehicle_id, newest, &features);
        debug!(
            vehicle_id,
            window = window.len(),
            urgency = %summary.urgency(),
            "health recomputed"
        );
        Ok(summary)
    }

    /// Score a full event list without touching the window store.
    /// The vehicle id is taken from the last event supplied.
    pub fn analyze_batch(
        &self,
        events: &[TelematicsEvent],
        maintenance: &[MaintenanceRecord],
    ) -> Result<HealthSummary> {
        let last = events.last().ok_or(HealthError::EmptyEvents)?;
        let newest = events
            .iter()
            .map(|e| e.timestamp)
            .max()
            .unwrap_or(last.timestamp);
        let features = self.extractor.extract(events, maintenance)?;
        Ok(score(&last.vehicle_id, newest, &features))
    }

    pub fn detect_vehicle_anomalies(
        &self,
        vehicle_id: &str,
        events: &[TelematicsEvent],
        health: &HealthSummary,
    ) -> VehicleAnomalyReport {
        let report = self.detector.detect_vehicle(vehicle_id, events, Some(health));
        if !report.anomalies.is_empty() {
            info!(
                vehicle_id,
                count = report.anomalies.len(),
                risk = %report.overall_risk,
                "vehicle anomalies detected"
            );
        }
        report
    }

    pub fn detect_driver_anomalies(&self, driver_id: &str, events: &[TelematicsEvent]) -> DriverAnomalyReport {
        let report = self.detector.detect_driver(driver_id, events);
        if !report.anomalies.is_empty() {
            info!(
                driver_id,
                count = report.anomalies.len(),
                safety_score = report.safety_score,
                "driver anomalies detected"
            );
        }
        report
    }

    pub fn forecast_demand(
        &self,
        center_id: &str,
        horizon_days: u32,
        assignment: &HashMap<String, String>,
        summaries: &[HealthSummary],
    ) -> DemandForecast {
        self.forecaster.forecast(center_id, horizon_days, assignment, summaries)
    }

    pub fn forecast_all(
        &self,
        center_ids: &[String],
        horizon_days: u32,
        assignment: &HashMap<String, String>,
        summaries: &[HealthSummary],
    ) -> Vec<DemandForecast> {
        self.forecaster.forecast_all(center_ids, horizon_days, assignment, summaries)
    }
}

fn score(vehicle_id: &str, timestamp: DateTime<Utc>, features: &FeatureVector) -> HealthSummary {
    HealthSummary {
        vehicle_id: vehicle_id.to_string(),
        timestamp,
        component_health: compute_all_components(features),
    }
}
