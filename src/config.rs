//! Engine configuration. Scoring weights are fixed constants in [`crate::health`];
//! only window shapes, forecasting assumptions and runtime plumbing live here.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Data directory (anomaly ledger)
    pub data_dir: PathBuf,
    /// Per-vehicle rolling buffer
    pub window: WindowConfig,
    /// Feature sub-window shapes
    pub features: FeaturesConfig,
    /// Demand forecasting assumptions
    pub demand: DemandConfig,
    /// Fleet batch processing
    pub fleet: FleetConfig,
    /// Simulation loop driven by the binary
    pub simulation: SimulationConfig,
    /// Anomaly ledger
    pub storage: StorageConfig,
    /// Optional reporting endpoint
    pub uplink: UplinkConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Events older than newest - max_days are evicted
    pub max_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Time sub-window (days before the latest event)
    pub window_days: i64,
    /// Distance sub-window (km below the latest odometer reading)
    pub window_km: f64,
    /// Count sub-window (most recent events)
    pub window_events: usize,
    /// Number of pseudo-trips kept
    pub trips: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandConfig {
    /// Assumed daily distance used to turn eta_km into days
    pub daily_km: f64,
    /// Default horizon when a caller does not specify one
    pub horizon_days: u32,
    /// Vehicle id → service center id
    pub vehicle_centers: BTreeMap<String, String>,
    /// Center for vehicles missing from `vehicle_centers`
    pub default_center_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Vehicles analysed concurrently
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds between simulated events; 0 runs a single cycle
    pub interval_secs: u64,
    /// Vehicles to simulate
    pub vehicle_ids: Vec<String>,
    /// Odometer of the first simulated event
    pub start_odometer_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub enabled: bool,
    /// Environment variable holding the ledger secret
    pub secret_env: String,
    /// Days of anomalies kept in the ledger
    pub retention_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UplinkConfig {
    pub enabled: bool,
    /// Endpoint URL when enabled
    pub endpoint: Option<String>,
    /// Request timeout
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .map(|d| d.join("fleet-health"))
                .unwrap_or_else(|| PathBuf::from(".fleet-health")),
            window: WindowConfig::default(),
            features: FeaturesConfig::default(),
            demand: DemandConfig::default(),
            fleet: FleetConfig::default(),
            simulation: SimulationConfig::default(),
            storage: StorageConfig::default(),
            uplink: UplinkConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { max_days: 7 }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            window_km: 500.0,
            window_events: 50,
            trips: 5,
        }
    }
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            daily_km: 40.0,
            horizon_days: 30,
            vehicle_centers: BTreeMap::new(),
            default_center_id: "CENTER-01".to_string(),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self { concurrency: 3 }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            vehicle_ids: vec!["VH-1000".to_string()],
            start_odometer_km: 25_000.0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret_env: "FLEET_HEALTH_SECRET".to_string(),
            retention_days: 90,
        }
    }
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            timeout_secs: 15,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl DemandConfig {
    /// Center assignment for `vehicle_ids`; unlisted vehicles go to the default center.
    pub fn assignment<'a>(&self, vehicle_ids: impl IntoIterator<Item = &'a str>) -> HashMap<String, String> {
        vehicle_ids
            .into_iter()
            .map(|v| {
                let center = self
                    .vehicle_centers
                    .get(v)
                    .unwrap_or(&self.default_center_id);
                (v.to_string(), center.clone())
            })
            .collect()
    }

    /// Distinct centers of an assignment, sorted.
    pub fn center_ids(assignment: &HashMap<String, String>) -> Vec<String> {
        assignment
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl EngineConfig {
    /// Load from JSON file if present; otherwise return default.
    /// A file that exists but does not parse is reported and ignored.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|data| serde_json::from_str::<EngineConfig>(&data).map_err(|e| e.to_string()))
        {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config unreadable; using defaults");
                Self::default()
            }
        }
    }
}
