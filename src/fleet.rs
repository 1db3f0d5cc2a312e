//! Fleet-wide batch analysis. Each vehicle is an independent unit of work; one
//! vehicle failing never aborts the others.

use crate::anomaly::{DriverAnomalyReport, VehicleAnomalyReport};
use crate::config::FleetConfig;
use crate::engine::HealthEngine;
use crate::error::Result;
use crate::health::{Component, HealthSummary};
use crate::risk::RiskLevel;
use crate::telemetry::{MaintenanceRecord, TelematicsEvent};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Inputs for one vehicle.
#[derive(Debug, Clone)]
pub struct VehicleBatch {
    pub vehicle_id: String,
    /// Driver to attribute behavior anomalies to, if known
    pub driver_id: Option<String>,
    pub events: Vec<TelematicsEvent>,
    pub maintenance: Vec<MaintenanceRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleOutcome {
    pub summary: HealthSummary,
    pub urgency: RiskLevel,
    pub vehicle_anomalies: VehicleAnomalyReport,
    pub driver_anomalies: Option<DriverAnomalyReport>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetReport {
    pub total_vehicles: usize,
    pub outcomes: BTreeMap<String, VehicleOutcome>,
    /// vehicle id → error
    pub failed: BTreeMap<String, String>,
    pub critical_count: usize,
    pub high_urgency_count: usize,
    /// Components most often at high risk, most frequent first (max 5)
    pub top_failing_parts: Vec<(Component, usize)>,
}

impl FleetReport {
    pub fn processed_ok(&self) -> usize {
        self.outcomes.len()
    }
}

pub struct FleetRunner {
    engine: Arc<HealthEngine>,
    concurrency: usize,
}

impl FleetRunner {
    pub fn new(engine: Arc<HealthEngine>, config: &FleetConfig) -> Self {
        Self {
            engine,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Analyse every vehicle on the blocking pool, at most `concurrency` at a time.
    pub async fn process_fleet(&self, batches: Vec<VehicleBatch>) -> FleetReport {
        let mut report = FleetReport {
            total_vehicles: batches.len(),
            ..Default::default()
        };
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(batches.len());

        for batch in batches {
            let vehicle_id = batch.vehicle_id.clone();
            let permit = match Arc::clone(&permits).acquire_owned().await {
                Ok(p) => p,
                Err(e) => {
                    report.failed.insert(vehicle_id, e.to_string());
                    continue;
                }
            };
            let engine = Arc::clone(&self.engine);
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                analyze_vehicle(&engine, &batch)
            });
            handles.push((vehicle_id, handle));
        }

        for (vehicle_id, handle) in handles {
            match handle.await {
                Ok(Ok(outcome)) => {
                    report.outcomes.insert(vehicle_id, outcome);
                }
                Ok(Err(e)) => {
                    warn!(vehicle_id = %vehicle_id, error = %e, "vehicle analysis failed");
                    report.failed.insert(vehicle_id, e.to_string());
                }
                Err(e) => {
                    warn!(vehicle_id = %vehicle_id, error = %e, "vehicle task aborted");
                    report.failed.insert(vehicle_id, e.to_string());
                }
            }
        }

        summarize(&mut report);
        info!(
            total = report.total_vehicles,
            ok = report.processed_ok(),
            failed = report.failed.len(),
            critical = report.critical_count,
            "fleet run complete"
        );
        report
    }
}

fn analyze_vehicle(engine: &HealthEngine, batch: &VehicleBatch) -> Result<VehicleOutcome> {
    let summary = engine.analyze_batch(&batch.events, &batch.maintenance)?;
    let vehicle_anomalies = engine.detect_vehicle_anomalies(&batch.vehicle_id, &batch.events, &summary);
    let driver_anomalies = batch
        .driver_id
        .as_deref()
        .map(|driver| engine.detect_driver_anomalies(driver, &batch.events));
    Ok(VehicleOutcome {
        urgency: summary.urgency(),
        summary,
        vehicle_anomalies,
        driver_anomalies,
    })
}

fn summarize(report: &mut FleetReport) {
    let mut part_counts: HashMap<Component, usize> = HashMap::new();
    for outcome in report.outcomes.values() {
        match outcome.urgency {
            RiskLevel::Critical => report.critical_count += 1,
            RiskLevel::High => report.high_urgency_count += 1,
            _ => {}
        }
        for h in &outcome.summary.component_health {
            if h.risk_level == RiskLevel::High {
                *part_counts.entry(h.component).or_default() += 1;
            }
        }
    }
    let mut parts: Vec<(Component, usize)> = part_counts.into_iter().collect();
    parts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    parts.truncate(5);
    report.top_failing_parts = parts;
}
