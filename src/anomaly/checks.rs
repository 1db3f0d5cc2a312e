//! Independent anomaly checks. Each returns zero or one finding.

use super::{severity_from_ratio, AnomalyKind, AnomalyRecord, BehaviorMetrics, Subject};
use crate::health::HealthScore;
use crate::risk::RiskLevel;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Component score at or below which a component is critical.
pub const CRITICAL_HEALTH_SCORE: f64 = 0.2;
/// Component score at or below which a critical component is near failure.
pub const FAILING_HEALTH_SCORE: f64 = 0.05;

/// Outcome of one check before it is attributed to a subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub kind: AnomalyKind,
    pub severity: f64,
    pub risk_level: RiskLevel,
    pub context: String,
}

impl Finding {
    pub fn into_record(self, subject: &Subject, detected_at: DateTime<Utc>) -> AnomalyRecord {
        AnomalyRecord {
            id: Uuid::new_v4().to_string(),
            kind: self.kind,
            severity: self.severity,
            risk_level: self.risk_level,
            context: self.context,
            subject: subject.clone(),
            detected_at,
        }
    }
}

/// A counter spike rule: trigger when `actual > baseline * multiplier`, where
/// `baseline = max(floor, per_event * total_events)`.
#[derive(Debug, Clone, Copy)]
pub struct SpikeRule {
    pub kind: AnomalyKind,
    pub floor: f64,
    pub per_event: f64,
    pub multiplier: f64,
    pub label: &'static str,
    pub risk: fn(f64) -> RiskLevel,
}

impl SpikeRule {
    pub fn baseline(&self, total_events: usize) -> f64 {
        self.floor.max(self.per_event * total_events as f64)
    }

    pub fn evaluate(&self, actual: u64, total_events: usize) -> Option<Finding> {
        let baseline = self.baseline(total_events);
        let actual = actual as f64;
        if actual <= baseline * self.multiplier {
            return None;
        }
        let severity = severity_from_ratio(actual, baseline);
        Some(Finding {
            kind: self.kind,
            severity,
            risk_level: (self.risk)(severity),
            context: format!("{}: {} (baseline ~{:.1})", self.label, actual, baseline),
        })
    }
}

fn high_from_7(severity: f64) -> RiskLevel {
    if severity >= 7.0 {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}

fn high_from_8(severity: f64) -> RiskLevel {
    if severity >= 8.0 {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}

fn always_high(_: f64) -> RiskLevel {
    RiskLevel::High
}

fn medium_from_5(severity: f64) -> RiskLevel {
    if severity >= 5.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

const VEHICLE_HARSH_BRAKING: SpikeRule = SpikeRule {
    kind: AnomalyKind::HarshBrakingSpike,
    floor: 5.0,
    per_event: 0.2,
    multiplier: 1.5,
    label: "Harsh braking events",
    risk: high_from_7,
};

const VEHICLE_HARSH_ACCELERATION: SpikeRule = SpikeRule {
    kind: AnomalyKind::HarshAccelerationSpike,
    floor: 5.0,
    per_event: 0.2,
    multiplier: 1.5,
    label: "Harsh acceleration events",
    risk: high_from_8,
};

const VEHICLE_SPEEDING: SpikeRule = SpikeRule {
    kind: AnomalyKind::SpeedViolationSpike,
    floor: 1.0,
    per_event: 0.05,
    multiplier: 2.0,
    label: "Speeding incidents (>100 km/h)",
    risk: always_high,
};

const VEHICLE_IDLING: SpikeRule = SpikeRule {
    kind: AnomalyKind::ExcessiveIdling,
    floor: 2.0,
    per_event: 0.1,
    multiplier: 2.0,
    label: "Idling events",
    risk: medium_from_5,
};

const DRIVER_HARSH_BRAKING: SpikeRule = SpikeRule {
    kind: AnomalyKind::DriverHarshBraking,
    floor: 3.0,
    per_event: 0.1,
    multiplier: 1.5,
    label: "Driver harsh braking events",
    risk: high_from_7,
};

const DRIVER_AGGRESSIVE_ACCELERATION: SpikeRule = SpikeRule {
    kind: AnomalyKind::DriverAggressiveAcceleration,
    floor: 3.0,
    per_event: 0.1,
    multiplier: 1.5,
    label: "Driver aggressive accelerations",
    risk: high_from_8,
};

const DRIVER_SPEEDING: SpikeRule = SpikeRule {
    kind: AnomalyKind::DriverSpeeding,
    floor: 1.0,
    per_event: 0.02,
    multiplier: 2.0,
    label: "Driver high-speed events (>100 km/h)",
    risk: always_high,
};

pub type BehaviorCheck = fn(&BehaviorMetrics) -> Option<Finding>;

pub fn harsh_braking_spike(m: &BehaviorMetrics) -> Option<Finding> {
    VEHICLE_HARSH_BRAKING.evaluate(m.harsh_brake_events, m.total_events)
}

pub fn harsh_acceleration_spike(m: &BehaviorMetrics) -> Option<Finding> {
    VEHICLE_HARSH_ACCELERATION.evaluate(m.harsh_accel_events, m.total_events)
}

pub fn speed_violation_spike(m: &BehaviorMetrics) -> Option<Finding> {
    VEHICLE_SPEEDING.evaluate(m.speed_violations, m.total_events)
}

pub fn excessive_idling(m: &BehaviorMetrics) -> Option<Finding> {
    VEHICLE_IDLING.evaluate(m.idling_events, m.total_events)
}

pub fn driver_harsh_braking(m: &BehaviorMetrics) -> Option<Finding> {
    DRIVER_HARSH_BRAKING.evaluate(m.harsh_brake_events, m.total_events)
}

pub fn driver_aggressive_acceleration(m: &BehaviorMetrics) -> Option<Finding> {
    DRIVER_AGGRESSIVE_ACCELERATION.evaluate(m.harsh_accel_events, m.total_events)
}

pub fn driver_speeding(m: &BehaviorMetrics) -> Option<Finding> {
    DRIVER_SPEEDING.evaluate(m.speed_violations, m.total_events)
}

/// Vehicle behavior checks, in reporting order.
pub const VEHICLE_CHECKS: [BehaviorCheck; 4] = [
    harsh_braking_spike,
    harsh_acceleration_spike,
    speed_violation_spike,
    excessive_idling,
];

/// Driver behavior checks, in reporting order.
pub const DRIVER_CHECKS: [BehaviorCheck; 3] = [
    driver_harsh_braking,
    driver_aggressive_acceleration,
    driver_speeding,
];

/// A component whose health has collapsed.
pub fn component_health_critical(score: &HealthScore) -> Option<Finding> {
    if score.health_score > CRITICAL_HEALTH_SCORE {
        return None;
    }
    let (severity, risk_level) = if score.health_score <= FAILING_HEALTH_SCORE {
        (9.0, RiskLevel::Critical)
    } else {
        (7.0, RiskLevel::High)
    };
    Some(Finding {
        kind: AnomalyKind::ComponentHealthCritical,
        severity,
        risk_level,
        context: format!(
            "{} health={:.2}, risk={}",
            score.component, score.health_score, score.risk_level
        ),
    })
}
