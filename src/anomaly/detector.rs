//! Vehicle and driver anomaly detection over a window of events.

use super::checks::{component_health_critical, Finding, DRIVER_CHECKS, VEHICLE_CHECKS};
use super::{
    overall_risk, safety_score, AnomalyRecord, AnomalySink, BehaviorMetrics, DrivingStyleMetrics, Subject,
};
use crate::health::HealthSummary;
use crate::risk::RiskLevel;
use crate::telemetry::TelematicsEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleAnomalyReport {
    pub vehicle_id: String,
    pub metrics: BehaviorMetrics,
    pub anomalies: Vec<AnomalyRecord>,
    pub overall_risk: RiskLevel,
    pub timestamp: DateTime<Utc>,
    /// Set when the sink rejected the anomalies; the report itself stays valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverAnomalyReport {
    pub driver_id: String,
    pub metrics: BehaviorMetrics,
    pub driving_style: DrivingStyleMetrics,
    pub anomalies: Vec<AnomalyRecord>,
    /// 10 is safest, 0 worst.
    pub safety_score: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

pub struct AnomalyDetector {
    sink: Arc<dyn AnomalySink>,
}

impl AnomalyDetector {
    pub fn new(sink: Arc<dyn AnomalySink>) -> Self {
        Self { sink }
    }

    /// Behavior spikes for the vehicle, plus any collapsed component in `health`.
    pub fn detect_vehicle(
        &self,
        vehicle_id: &str,
        events: &[TelematicsEvent],
        health: Option<&HealthSummary>,
    ) -> VehicleAnomalyReport {
        let now = Utc::now();
        let mut report = VehicleAnomalyReport {
            vehicle_id: vehicle_id.to_string(),
            metrics: BehaviorMetrics::default(),
            anomalies: Vec::new(),
            overall_risk: RiskLevel::Low,
            timestamp: now,
            persistence_error: None,
        };
        if events.is_empty() {
            return report;
        }

        let metrics = BehaviorMetrics::from_events(events);
        let component_findings = health
            .map(|h| h.component_health.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(component_health_critical);
        let findings: Vec<Finding> = VEHICLE_CHECKS
            .iter()
            .filter_map(|check| check(&metrics))
            .chain(component_findings)
            .collect();

        let subject = Subject::vehicle(vehicle_id);
        report.anomalies = findings.into_iter().map(|f| f.into_record(&subject, now)).collect();
        report.metrics = metrics;
        report.overall_risk = overall_risk(&report.anomalies);
        report.persistence_error = self.persist(&subject, &report.anomalies);
        debug!(
            vehicle_id,
            anomalies = report.anomalies.len(),
            risk = %report.overall_risk,
            "vehicle anomaly scan"
        );
        report
    }

    /// Behavior spikes attributed to a driver, folded into a safety score.
    pub fn detect_driver(&self, driver_id: &str, events: &[TelematicsEvent]) -> DriverAnomalyReport {
        let now = Utc::now();
        let mut report = DriverAnomalyReport {
            driver_id: driver_id.to_string(),
            metrics: BehaviorMetrics::default(),
            driving_style: DrivingStyleMetrics::default(),
            anomalies: Vec::new(),
            safety_score: 10.0,
            timestamp: now,
            persistence_error: None,
        };
        if events.is_empty() {
            return report;
        }

        let metrics = BehaviorMetrics::from_events(events);
        let subject = Subject::driver(driver_id);
        report.anomalies = DRIVER_CHECKS
            .iter()
            .filter_map(|check| check(&metrics))
            .map(|f| f.into_record(&subject, now))
            .collect();
        report.metrics = metrics;
        report.driving_style = DrivingStyleMetrics::from_events(events);
        report.safety_score = safety_score(&report.anomalies);
        report.persistence_error = self.persist(&subject, &report.anomalies);
        debug!(
            driver_id,
            anomalies = report.anomalies.len(),
            safety_score = report.safety_score,
            "driver anomaly scan"
        );
        report
    }

    fn persist(&self, subject: &Subject, anomalies: &[AnomalyRecord]) -> Option<String> {
        if anomalies.is_empty() {
            return None;
        }
        match self.sink.record_anomalies(subject, anomalies) {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    subject_id = %subject.id,
                    subject_kind = subject.kind.as_str(),
                    count = anomalies.len(),
                    error = %e,
                    "failed to record anomalies"
                );
                Some(e.to_string())
            }
        }
    }
}
