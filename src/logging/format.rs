//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use crate::config::LogConfig;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
pub struct LogEvent<'a> {
    pub ts: &'a str,
    pub level: &'a str,
    pub target: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<&'a str>,
}

/// Process-wide tracing setup plus a direct ndjson writer for sinks.
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber. Logs go to stderr so stdout stays free for
    /// command output; `RUST_LOG` overrides the configured level.
    /// Fails if a global subscriber is already set.
    pub fn init(config: &LogConfig) -> Result<(), TryInitError> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
        let registry = tracing_subscriber::registry().with(filter);
        if config.json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_current_span(false)
                        .with_span_list(false)
                        .with_writer(std::io::stderr),
                )
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
        }
    }

    /// Write a single structured line without going through tracing.
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(w, "{}", line)
    }
}
