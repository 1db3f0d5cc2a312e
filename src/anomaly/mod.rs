//! Baseline-relative anomaly detection for vehicles and drivers.
//!
//! Baselines are derived from the window under inspection rather than from a
//! historical model: a counter is anomalous when it exceeds a multiple of what
//! the window size alone would predict.

mod checks;
mod detector;
mod sink;

pub use checks::{
    component_health_critical, driver_aggressive_acceleration, driver_harsh_braking,
    driver_speeding, excessive_idling, harsh_acceleration_spike, harsh_braking_spike,
    speed_violation_spike, BehaviorCheck, Finding, SpikeRule, DRIVER_CHECKS, VEHICLE_CHECKS,
};
pub use detector::{AnomalyDetector, DriverAnomalyReport, VehicleAnomalyReport};
pub use sink::{AnomalySink, FanoutSink, JsonLinesSink, MemorySink, NullSink};

use crate::risk::RiskLevel;
use crate::telemetry::TelematicsEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speed above which a reading counts as a violation (km/h).
pub const SPEED_LIMIT_KMPH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    HarshBrakingSpike,
    HarshAccelerationSpike,
    SpeedViolationSpike,
    ExcessiveIdling,
    ComponentHealthCritical,
    DriverHarshBraking,
    DriverAggressiveAcceleration,
    DriverSpeeding,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::HarshBrakingSpike => "HARSH_BRAKING_SPIKE",
            AnomalyKind::HarshAccelerationSpike => "HARSH_ACCELERATION_SPIKE",
            AnomalyKind::SpeedViolationSpike => "SPEED_VIOLATION_SPIKE",
            AnomalyKind::ExcessiveIdling => "EXCESSIVE_IDLING",
            AnomalyKind::ComponentHealthCritical => "COMPONENT_HEALTH_CRITICAL",
            AnomalyKind::DriverHarshBraking => "DRIVER_HARSH_BRAKING",
            AnomalyKind::DriverAggressiveAcceleration => "DRIVER_AGGRESSIVE_ACCELERATION",
            AnomalyKind::DriverSpeeding => "DRIVER_SPEEDING",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Vehicle,
    Driver,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Vehicle => "vehicle",
            SubjectKind::Driver => "driver",
        }
    }
}

/// Who an anomaly is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub kind: SubjectKind,
    pub id: String,
}

impl Subject {
    pub fn vehicle(id: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Vehicle,
            id: id.into(),
        }
    }

    pub fn driver(id: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Driver,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub id: String,
    pub kind: AnomalyKind,
    /// 0 ..= 10
    pub severity: f64,
    pub risk_level: RiskLevel,
    pub context: String,
    pub subject: Subject,
    pub detected_at: DateTime<Utc>,
}

/// Behavioral counters over one window of events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorMetrics {
    pub total_events: usize,
    pub harsh_brake_events: u64,
    pub harsh_accel_events: u64,
    pub speed_violations: u64,
    pub idling_events: u64,
}

impl BehaviorMetrics {
    pub fn from_events(events: &[TelematicsEvent]) -> Self {
        events.iter().fold(
            BehaviorMetrics {
                total_events: events.len(),
                ..Default::default()
            },
            |mut m, e| {
                m.harsh_brake_events += u64::from(e.hard_brake_events_last_10min);
                m.harsh_accel_events += u64::from(e.harsh_accel_events_last_10min);
                if e.speed_kmph > SPEED_LIMIT_KMPH {
                    m.speed_violations += 1;
                }
                if e.is_idling() {
                    m.idling_events += 1;
                }
                m
            },
        )
    }
}

/// Brake pedal reading (fraction of full travel) counted as a harsh stop.
pub const HARSH_BRAKE_PRESSURE: f64 = 0.7;
/// Longitudinal acceleration counted as a rapid start (m/s²).
pub const RAPID_ACCEL_MPS2: f64 = 1.5;
/// Speed counted as a high-speed incident (km/h, inclusive).
pub const HIGH_SPEED_KMPH: f64 = 100.0;
/// At or below this speed the vehicle is stopped (km/h).
pub const STOPPED_SPEED_KMPH: f64 = 2.0;
/// Stops shorter than this do not count as idling (seconds).
pub const MIN_IDLE_SECS: f64 = 30.0;

/// Per-reading driving style counters, read from the raw sensor values rather
/// than the vehicle's own 10-minute counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DrivingStyleMetrics {
    pub harsh_braking_count: u64,
    pub rapid_accel_count: u64,
    pub high_speed_incidents: u64,
    /// Total length of closed stops lasting at least [`MIN_IDLE_SECS`].
    /// A stop still open at the end of the window is not counted.
    pub excessive_idle_seconds: f64,
}

impl DrivingStyleMetrics {
    pub fn from_events(events: &[TelematicsEvent]) -> Self {
        let mut sorted: Vec<&TelematicsEvent> = events.iter().collect();
        sorted.sort_by_key(|e| e.timestamp);

        let mut m = DrivingStyleMetrics::default();
        let mut stopped_since: Option<DateTime<Utc>> = None;
        for e in sorted {
            if e.brake_pedal_pressure >= HARSH_BRAKE_PRESSURE {
                m.harsh_braking_count += 1;
            }
            if e.accel_longitudinal >= RAPID_ACCEL_MPS2 {
                m.rapid_accel_count += 1;
            }
            if e.speed_kmph >= HIGH_SPEED_KMPH {
                m.high_speed_incidents += 1;
            }

            if e.speed_kmph <= STOPPED_SPEED_KMPH {
                stopped_since.get_or_insert(e.timestamp);
            } else if let Some(start) = stopped_since.take() {
                let secs = (e.timestamp - start).num_milliseconds() as f64 / 1000.0;
                if secs >= MIN_IDLE_SECS {
                    m.excessive_idle_seconds += secs;
                }
            }
        }
        m
    }
}

/// Severity on a 2..=10 scale from how far `actual` overshoots `baseline`.
/// A non-positive baseline falls back to the raw count, capped at 10.
pub fn severity_from_ratio(actual: f64, baseline: f64) -> f64 {
    if baseline <= 0.0 {
        return actual.min(10.0);
    }
    let ratio = actual / baseline;
    if ratio < 1.2 {
        2.0
    } else if ratio < 1.5 {
        4.0
    } else if ratio < 2.0 {
        6.0
    } else if ratio < 3.0 {
        8.0
    } else {
        10.0
    }
}

/// Overall vehicle risk: driven by the single worst anomaly.
pub fn overall_risk(anomalies: &[AnomalyRecord]) -> RiskLevel {
    anomalies
        .iter()
        .map(|a| a.severity)
        .reduce(f64::max)
        .map_or(RiskLevel::Low, RiskLevel::from_max_severity)
}

/// Driver safety score: 10 minus the mean anomaly severity, floored at 0.
pub fn safety_score(anomalies: &[AnomalyRecord]) -> f64 {
    if anomalies.is_empty() {
        return 10.0;
    }
    let mean = anomalies.iter().map(|a| a.severity).sum::<f64>() / anomalies.len() as f64;
    (10.0 - mean).max(0.0)
}
