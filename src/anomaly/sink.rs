//! Hand-off of detected anomalies to an external persistence or reporting collaborator.

use super::{AnomalyRecord, Subject};
use crate::error::SinkError;
use crate::logging::{LogEvent, StructuredLogger};
use parking_lot::Mutex;
use std::io::Write;

/// Receiver for anomaly batches. Called synchronously once per detection run
/// that found something; errors are reported by the caller, never propagated.
pub trait AnomalySink: Send + Sync {
    fn record_anomalies(&self, subject: &Subject, anomalies: &[AnomalyRecord]) -> Result<(), SinkError>;
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl AnomalySink for NullSink {
    fn record_anomalies(&self, _subject: &Subject, _anomalies: &[AnomalyRecord]) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<(Subject, Vec<AnomalyRecord>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `record_anomalies` calls received.
    pub fn calls(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn records(&self) -> Vec<AnomalyRecord> {
        self.batches
            .lock()
            .iter()
            .flat_map(|(_, batch)| batch.iter().cloned())
            .collect()
    }
}

impl AnomalySink for MemorySink {
    fn record_anomalies(&self, subject: &Subject, anomalies: &[AnomalyRecord]) -> Result<(), SinkError> {
        self.batches.lock().push((subject.clone(), anomalies.to_vec()));
        Ok(())
    }
}

/// One JSON object per anomaly, one per line.
pub struct JsonLinesSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> AnomalySink for JsonLinesSink<W> {
    fn record_anomalies(&self, subject: &Subject, anomalies: &[AnomalyRecord]) -> Result<(), SinkError> {
        let mut out = self.out.lock();
        for a in anomalies {
            let ts = a.detected_at.to_rfc3339();
            let line = LogEvent {
                ts: &ts,
                level: "warn",
                target: "fleet_health::anomaly",
                message: &a.context,
                subject_id: Some(&subject.id),
                subject_kind: Some(subject.kind.as_str()),
                kind: Some(a.kind.as_str()),
                severity: Some(a.severity),
                risk_level: Some(a.risk_level.as_str()),
            };
            StructuredLogger::emit_json(&line, &mut *out)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Forwards each batch to every inner sink. All sinks are tried; the first
/// error is returned.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<std::sync::Arc<dyn AnomalySink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<std::sync::Arc<dyn AnomalySink>>) -> Self {
        Self { sinks }
    }
}

impl AnomalySink for FanoutSink {
    fn record_anomalies(&self, subject: &Subject, anomalies: &[AnomalyRecord]) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.record_anomalies(subject, anomalies) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
