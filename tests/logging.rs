//! Global logger installation. Kept in its own test binary: the subscriber is process-wide.

use fleet_health::config::LogConfig;
use fleet_health::logging::StructuredLogger;

#[test]
fn logger_installs_once() {
    let config = LogConfig {
        level: "debug".into(),
        json: true,
    };
    StructuredLogger::init(&config).unwrap();
    tracing::info!(vehicle_id = "VH-1", "logger ready");
    assert!(StructuredLogger::init(&config).is_err());
}
