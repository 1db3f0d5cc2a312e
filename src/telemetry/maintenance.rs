//! Service history entries and replacement-distance lookups.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacedPart {
    #[serde(default)]
    pub part_number: String,
    /// Component tag, e.g. "brake_pad" or "battery".
    pub component: String,
    #[serde(default = "one")]
    pub qty: u32,
    /// "wear", "defect", "accident", ...
    #[serde(default)]
    pub reason_code: String,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    #[serde(default)]
    pub record_id: String,
    pub vehicle_id: String,
    #[serde(default)]
    pub service_date: Option<String>,
    pub odometer_km: f64,
    #[serde(default)]
    pub service_center_id: Option<String>,
    #[serde(default)]
    pub parts_replaced: Vec<ReplacedPart>,
    #[serde(default)]
    pub warranty_flag: bool,
}

impl MaintenanceRecord {
    pub fn replaced(&self, component: &str) -> bool {
        self.parts_replaced.iter().any(|p| p.component == component)
    }
}

/// Distance driven since `component` was last replaced.
///
/// The replacing record with the highest odometer wins. With no matching record
/// the whole `latest_odometer` counts, as if the part were original.
pub fn km_since_last_replacement(
    history: &[MaintenanceRecord],
    latest_odometer: f64,
    component: &str,
) -> f64 {
    let last = history
        .iter()
        .filter(|r| r.replaced(component))
        .map(|r| r.odometer_km)
        .fold(None, |acc: Option<f64>, odo| Some(acc.map_or(odo, |a| a.max(odo))));

    match last {
        Some(odo) => (latest_odometer - odo).max(0.0),
        None => latest_odometer,
    }
}
