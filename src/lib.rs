//! Fleet Health: predictive maintenance and anomaly detection over vehicle telemetry.
//!
//! Modular structure:
//! - [`telemetry`]: Event and maintenance record types, timestamp parsing
//! - [`window`]: Per-vehicle sliding event windows
//! - [`features`]: Multi-window feature extraction pipeline
//! - [`health`]: Component health scoring
//! - [`anomaly`]: Vehicle and driver anomaly detection, anomaly sinks
//! - [`demand`]: Service-center parts demand forecasting
//! - [`engine`]: Facade wiring the above together
//! - [`fleet`]: Concurrent fleet-wide batch analysis
//! - [`storage`]: Encrypted local anomaly ledger
//! - [`uplink`]: Optional backend reporting
//! - [`logging`]: Structured JSON logging

pub mod anomaly;
pub mod config;
pub mod demand;
pub mod engine;
pub mod error;
pub mod features;
pub mod fleet;
pub mod health;
pub mod logging;
pub mod risk;
pub mod simulation;
pub mod storage;
pub mod telemetry;
pub mod uplink;
pub mod window;

pub use anomaly::{AnomalyRecord, AnomalySink, DriverAnomalyReport, VehicleAnomalyReport};
pub use config::EngineConfig;
pub use demand::DemandForecast;
pub use engine::HealthEngine;
pub use error::{HealthError, SinkError};
pub use features::{FeatureExtractor, FeatureVector};
pub use fleet::{FleetReport, FleetRunner, VehicleBatch};
pub use health::{Component, HealthScore, HealthSummary};
pub use logging::StructuredLogger;
pub use risk::RiskLevel;
pub use storage::AnomalyStore;
pub use telemetry::{MaintenanceRecord, TelematicsEvent};
pub use window::WindowStore;
