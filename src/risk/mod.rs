//! Coarse risk tiers shared by health scoring, anomaly detection and forecasting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health score below this is high risk.
pub const HIGH_RISK_BELOW: f64 = 0.3;
/// Health score below this is medium risk.
pub const MEDIUM_RISK_BELOW: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Tier for a component health score in [0, 1]. Never `Critical`.
    pub fn from_health_score(score: f64) -> Self {
        if score < HIGH_RISK_BELOW {
            RiskLevel::High
        } else if score < MEDIUM_RISK_BELOW {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Tier for the worst anomaly severity on the 0..=10 scale.
    pub fn from_max_severity(severity: f64) -> Self {
        if severity >= 9.0 {
            RiskLevel::Critical
        } else if severity >= 7.0 {
            RiskLevel::High
        } else if severity >= 4.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
