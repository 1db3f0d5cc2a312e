//! Per-component health scores and the per-vehicle summary built from them.

mod scorer;

pub use scorer::{
    compute_all_components, compute_battery_health, compute_brake_health, compute_engine_health,
    compute_tire_health,
};

use crate::risk::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Monitored mechanical component.
///
/// Closed set: only components with a scoring model exist here, so summaries
/// and forecasts never carry a tag the scorer cannot produce. Decoding an
/// unknown tag (e.g. "transmission") is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    BrakePad,
    Battery,
    Tire,
    Engine,
}

impl Component {
    /// Scoring order of [`compute_all_components`].
    pub const ALL: [Component; 4] = [
        Component::BrakePad,
        Component::Battery,
        Component::Tire,
        Component::Engine,
    ];

    /// Tag used in maintenance records and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::BrakePad => "brake_pad",
            Component::Battery => "battery",
            Component::Tire => "tire",
            Component::Engine => "engine",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub component: Component,
    /// 0 (failed) ..= 1 (new)
    pub health_score: f64,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_days: Option<f64>,
    /// Inputs behind the score, for explainability
    #[serde(default)]
    pub details: BTreeMap<String, f64>,
}

impl HealthScore {
    /// Score is clamped to [0, 1] and the risk tier derived from it.
    pub fn new(component: Component, health_score: f64) -> Self {
        let health_score = health_score.clamp(0.0, 1.0);
        Self {
            component,
            health_score,
            risk_level: RiskLevel::from_health_score(health_score),
            eta_km: None,
            eta_days: None,
            details: BTreeMap::new(),
        }
    }

    pub fn with_eta_km(mut self, km: f64) -> Self {
        self.eta_km = Some(km);
        self
    }

    pub fn with_eta_days(mut self, days: f64) -> Self {
        self.eta_days = Some(days);
        self
    }

    pub fn with_detail(mut self, name: &str, value: f64) -> Self {
        self.details.insert(name.to_string(), value);
        self
    }
}

/// Latest health state of one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub component_health: Vec<HealthScore>,
}

impl HealthSummary {
    pub fn component(&self, component: Component) -> Option<&HealthScore> {
        self.component_health.iter().find(|h| h.component == component)
    }

    /// Service urgency across components.
    ///
    /// Critical when two or more components are high risk with a mean score
    /// under 0.2; high when the brakes alone are high risk; medium for any other
    /// high-risk component.
    pub fn urgency(&self) -> RiskLevel {
        let high: Vec<&HealthScore> = self
            .component_health
            .iter()
            .filter(|h| h.risk_level == RiskLevel::High)
            .collect();
        if high.is_empty() {
            return RiskLevel::Low;
        }
        let mean = high.iter().map(|h| h.health_score).sum::<f64>() / high.len() as f64;
        if high.len() >= 2 && mean < 0.2 {
            RiskLevel::Critical
        } else if high.iter().any(|h| h.component == Component::BrakePad) {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}
