//! Timestamp parsing for ingested telemetry. Accepts RFC 3339 and naive ISO 8601
//! (interpreted as UTC); anything else is rejected at ingestion.

use crate::error::{HealthError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let mut last_err = None;
    for fmt in NAIVE_FORMATS {
        match NaiveDateTime::parse_from_str(value, fmt) {
            Ok(naive) => return Ok(naive.and_utc()),
            Err(e) => last_err = Some(e),
        }
    }
    Err(HealthError::InvalidTimestamp {
        value: value.to_string(),
        reason: last_err.map(|e| e.to_string()).unwrap_or_default(),
    })
}

/// Serde adapter: RFC 3339 out, [`parse_timestamp`] in.
pub mod serde_ts {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(de::Error::custom)
    }
}
