//! Error kinds surfaced by the engine and by anomaly sinks.

use thiserror::Error;

/// Input errors raised by the core pipeline.
#[derive(Error, Debug)]
pub enum HealthError {
    /// At least one telemetry event is required.
    #[error("no telemetry events provided")]
    EmptyEvents,

    /// Timestamp could not be parsed as RFC 3339 or naive ISO 8601.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Telemetry record could not be decoded.
    #[error("malformed telemetry record: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    /// Record `line` (1-based) of an ndjson stream could not be decoded.
    #[error("malformed telemetry at line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Event routed to a vehicle it does not belong to.
    #[error("event for vehicle {found:?} submitted as {expected:?}")]
    VehicleMismatch { expected: String, found: String },
}

/// Failures of an external anomaly collaborator. Never fatal to detection.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("uplink error: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, HealthError>;
