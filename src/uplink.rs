//! Uplink client: report anomalies and health summaries to a fleet backend.

use crate::anomaly::{AnomalyRecord, AnomalySink, Subject};
use crate::config::UplinkConfig;
use crate::error::SinkError;
use crate::health::{HealthScore, HealthSummary};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Payloads for the backend ingest endpoints.
#[derive(Serialize)]
struct AnomalyPayload<'a> {
    subject_kind: &'static str,
    subject_id: &'a str,
    anomalies: &'a [AnomalyRecord],
}

#[derive(Serialize)]
struct HealthPayload<'a> {
    vehicle_id: &'a str,
    ts: String,
    urgency: &'static str,
    component_health: &'a [HealthScore],
}

pub struct UplinkSink {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl UplinkSink {
    /// None when no endpoint is configured or the client cannot be built.
    pub fn new(config: &UplinkConfig) -> Option<Self> {
        let endpoint = config.endpoint.as_deref()?.trim_end_matches('/');
        if endpoint.is_empty() {
            return None;
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .ok()?;
        Some(Self {
            client,
            base_url: endpoint.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), SinkError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| SinkError::Http(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().unwrap_or_default();
            return Err(SinkError::Http(format!("{} {}", status, text)));
        }
        Ok(())
    }

    /// Push one vehicle's latest component health.
    pub fn report_health(&self, summary: &HealthSummary) -> Result<(), SinkError> {
        let payload = HealthPayload {
            vehicle_id: &summary.vehicle_id,
            ts: summary.timestamp.to_rfc3339(),
            urgency: summary.urgency().as_str(),
            component_health: &summary.component_health,
        };
        self.post("/api/v1/health", &payload)?;
        debug!(vehicle_id = %summary.vehicle_id, "uplink health reported");
        Ok(())
    }
}

impl AnomalySink for UplinkSink {
    fn record_anomalies(&self, subject: &Subject, anomalies: &[AnomalyRecord]) -> Result<(), SinkError> {
        let payload = AnomalyPayload {
            subject_kind: subject.kind.as_str(),
            subject_id: &subject.id,
            anomalies,
        };
        self.post("/api/v1/anomalies", &payload)?;
        info!(subject_id = %subject.id, count = anomalies.len(), "uplink anomalies reported");
        Ok(())
    }
}
