//! Fleet health entrypoint: offline-first, optional uplink.
//! Replays an ndjson telemetry file when `FLEET_HEALTH_REPLAY` is set, otherwise
//! runs a simulated drive loop per configured vehicle until Ctrl+C.

use chrono::Utc;
use fleet_health::{
    anomaly::{AnomalySink, FanoutSink},
    config::{DemandConfig, EngineConfig},
    demand::DemandForecast,
    engine::HealthEngine,
    fleet::{FleetReport, FleetRunner, VehicleBatch},
    health::HealthSummary,
    logging::StructuredLogger,
    simulation::{evolve, SimulationState},
    storage::AnomalyStore,
    telemetry::TelematicsEvent,
    uplink::UplinkSink,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

static STOP: AtomicBool = AtomicBool::new(false);

#[derive(Serialize)]
struct ReplayOutput<'a> {
    fleet: &'a FleetReport,
    demand: &'a [DemandForecast],
}

fn load_replay(path: &Path) -> Result<Vec<VehicleBatch>, BoxError> {
    let raw = std::fs::read_to_string(path)?;
    let mut by_vehicle: BTreeMap<String, Vec<TelematicsEvent>> = BTreeMap::new();
    for ev in TelematicsEvent::parse_ndjson(&raw)? {
        by_vehicle.entry(ev.vehicle_id.clone()).or_default().push(ev);
    }
    Ok(by_vehicle
        .into_iter()
        .map(|(vehicle_id, mut events)| {
            events.sort_by_key(|e| e.timestamp);
            VehicleBatch {
                vehicle_id,
                driver_id: None,
                events,
                maintenance: Vec::new(),
            }
        })
        .collect())
}

fn run_replay(
    engine: Arc<HealthEngine>,
    config: &EngineConfig,
    path: &Path,
    uplink: Option<&UplinkSink>,
) -> Result<(), BoxError> {
    let batches = load_replay(path)?;
    info!(vehicles = batches.len(), path = ?path, "replaying telemetry");

    let runner = FleetRunner::new(Arc::clone(&engine), &config.fleet);
    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(runner.process_fleet(batches));

    let summaries: Vec<HealthSummary> = report.outcomes.values().map(|o| o.summary.clone()).collect();
    if let Some(u) = uplink {
        for summary in &summaries {
            if let Err(e) = u.report_health(summary) {
                warn!(vehicle_id = %summary.vehicle_id, error = %e, "uplink health failed");
            }
        }
    }

    let assignment = config
        .demand
        .assignment(summaries.iter().map(|s| s.vehicle_id.as_str()));
    let centers = DemandConfig::center_ids(&assignment);
    let forecasts = engine.forecast_all(&centers, config.demand.horizon_days, &assignment, &summaries);
    for f in &forecasts {
        info!(
            center_id = %f.center_id,
            horizon_days = f.horizon_days,
            components = f.predictions.len(),
            "demand forecast"
        );
    }

    let out = ReplayOutput {
        fleet: &report,
        demand: &forecasts,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_one_cycle(
    engine: &HealthEngine,
    vehicles: &mut [(SimulationState, TelematicsEvent)],
    uplink: Option<&UplinkSink>,
) -> Result<(), BoxError> {
    let now = Utc::now();
    for (state, last) in vehicles.iter_mut() {
        let (next_state, event) = evolve(*state, last, now);
        *state = next_state;
        *last = event.clone();

        let vehicle_id = event.vehicle_id.clone();
        let summary = engine.process_event(&vehicle_id, event, &[])?;
        info!(
            vehicle_id = %vehicle_id,
            phase = ?state.phase(),
            urgency = %summary.urgency(),
            "health summary"
        );

        let window = engine.windows().get_window(&vehicle_id);
        let report = engine.detect_vehicle_anomalies(&vehicle_id, &window, &summary);
        if let Some(err) = &report.persistence_error {
            warn!(vehicle_id = %vehicle_id, error = %err, "anomalies not persisted");
        }
        if let Some(u) = uplink {
            if let Err(e) = u.report_health(&summary) {
                warn!(vehicle_id = %vehicle_id, error = %e, "uplink health failed");
            }
        }
    }
    Ok(())
}

fn run_simulation(
    engine: &HealthEngine,
    config: &EngineConfig,
    uplink: Option<&UplinkSink>,
) -> Result<(), BoxError> {
    let start = Utc::now();
    let mut vehicles: Vec<(SimulationState, TelematicsEvent)> = config
        .simulation
        .vehicle_ids
        .iter()
        .map(|id| {
            (
                SimulationState::new(),
                TelematicsEvent::nominal(id.as_str(), start, config.simulation.start_odometer_km),
            )
        })
        .collect();

    let interval_secs = config.simulation.interval_secs;
    if interval_secs == 0 {
        run_one_cycle(engine, &mut vehicles, uplink)?;
        info!("simulation cycle complete");
        return Ok(());
    }
    info!(interval_secs, vehicles = vehicles.len(), "simulation mode (Ctrl+C to stop)");
    let _ = ctrlc::set_handler(|| {
        STOP.store(true, Ordering::Relaxed);
    });

    let mut cycle: u64 = 0;
    while !STOP.load(Ordering::Relaxed) {
        cycle += 1;
        if let Err(e) = run_one_cycle(engine, &mut vehicles, uplink) {
            warn!(cycle, error = %e, "cycle failed");
        }
        for _ in 0..interval_secs {
            if STOP.load(Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(Duration::from_secs(1));
        }
    }
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let config_path = std::env::var("FLEET_HEALTH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = EngineConfig::load(&config_path);

    StructuredLogger::init(&config.log)?;

    info!(data_dir = ?config.data_dir, "fleet health starting");

    let mut sinks: Vec<Arc<dyn AnomalySink>> = Vec::new();
    if config.storage.enabled {
        std::fs::create_dir_all(&config.data_dir)?;
        let secret = std::env::var(&config.storage.secret_env).unwrap_or_else(|_| {
            warn!(var = %config.storage.secret_env, "no storage secret set, using placeholder");
            "fleet-health-secret-placeholder".to_string()
        });
        let store = AnomalyStore::open(&config.data_dir.join("anomalies.db"), secret.as_bytes())?;
        let cutoff = Utc::now() - chrono::Duration::days(config.storage.retention_days);
        let pruned = store.prune_before(cutoff)?;
        if pruned > 0 {
            info!(pruned, "expired anomalies removed");
        }
        sinks.push(Arc::new(store));
    }

    let uplink: Option<Arc<UplinkSink>> = if config.uplink.enabled {
        UplinkSink::new(&config.uplink).map(Arc::new)
    } else {
        None
    };
    if let Some(u) = &uplink {
        info!(endpoint = %u.base_url(), "uplink enabled");
        sinks.push(Arc::clone(u) as Arc<dyn AnomalySink>);
    }

    let engine = Arc::new(HealthEngine::new(&config, Arc::new(FanoutSink::new(sinks))));

    match std::env::var_os("FLEET_HEALTH_REPLAY") {
        Some(path) => run_replay(engine, &config, Path::new(&path), uplink.as_deref())?,
        None => run_simulation(&engine, &config, uplink.as_deref())?,
    }

    info!("fleet health stopping");
    Ok(())
}
