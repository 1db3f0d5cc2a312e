//! Parts-demand forecasting: health summaries rolled up per service center.

use crate::config::DemandConfig;
use crate::health::{Component, HealthSummary};
use crate::risk::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentForecast {
    pub component: Component,
    pub predicted_jobs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub center_id: String,
    pub horizon_days: u32,
    pub predictions: Vec<ComponentForecast>,
}

impl DemandForecast {
    pub fn jobs_for(&self, component: Component) -> Option<u32> {
        self.predictions
            .iter()
            .find(|p| p.component == component)
            .map(|p| p.predicted_jobs)
    }
}

/// Expected share of a component's vehicles that turn into a service job.
fn risk_weight(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Medium => 0.5,
        RiskLevel::High => 0.9,
        _ => 0.1,
    }
}

pub struct DemandForecaster {
    daily_km: f64,
}

impl DemandForecaster {
    pub fn new(config: &DemandConfig) -> Self {
        Self {
            daily_km: config.daily_km.max(0.1),
        }
    }

    /// Forecast component jobs at `center_id` over the next `horizon_days`.
    ///
    /// Only vehicles assigned to the center contribute. A component counts when
    /// its time to failure (days, or km at the assumed daily distance) falls
    /// inside the horizon and its risk is above low; it adds its risk weight.
    /// Accumulated weights are rounded half-to-even.
    pub fn forecast(
        &self,
        center_id: &str,
        horizon_days: u32,
        assignment: &HashMap<String, String>,
        summaries: &[HealthSummary],
    ) -> DemandForecast {
        let horizon = f64::from(horizon_days);
        let mut counts: Vec<(Component, f64)> = Vec::new();

        let assigned = summaries
            .iter()
            .filter(|s| assignment.get(&s.vehicle_id).map(String::as_str) == Some(center_id));
        for summary in assigned {
            for h in &summary.component_health {
                let eta = match (h.eta_days, h.eta_km) {
                    (Some(days), _) => days,
                    (None, Some(km)) => km / self.daily_km,
                    (None, None) => continue,
                };
                let weight = risk_weight(h.risk_level);
                if eta > horizon || weight <= 0.1 {
                    continue;
                }
                match counts.iter_mut().find(|(c, _)| *c == h.component) {
                    Some((_, total)) => *total += weight,
                    None => counts.push((h.component, weight)),
                }
            }
        }

        DemandForecast {
            center_id: center_id.to_string(),
            horizon_days,
            predictions: counts
                .into_iter()
                .map(|(component, total)| ComponentForecast {
                    component,
                    predicted_jobs: total.round_ties_even() as u32,
                })
                .collect(),
        }
    }

    /// One forecast per center, in the order given.
    pub fn forecast_all(
        &self,
        center_ids: &[String],
        horizon_days: u32,
        assignment: &HashMap<String, String>,
        summaries: &[HealthSummary],
    ) -> Vec<DemandForecast> {
        center_ids
            .iter()
            .map(|c| self.forecast(c, horizon_days, assignment, summaries))
            .collect()
    }
}

impl Default for DemandForecaster {
    fn default() -> Self {
        Self::new(&DemandConfig::default())
    }
}
