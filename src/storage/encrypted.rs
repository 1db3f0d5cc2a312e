//! SQLite-backed anomaly ledger. The free-form context column can carry driver
//! behavior details, so it is AES-GCM encrypted at rest.
//! Key derived from a deployment secret (in production: a KMS or keystore).

use crate::anomaly::{AnomalyRecord, AnomalySink, Subject};
use crate::error::SinkError;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rand::RngCore;
use rusqlite::{params, Connection};
use std::path::Path;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, SinkError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| SinkError::Encryption(e.to_string()))?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|e| SinkError::Encryption(e.to_string()))?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>, SinkError> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| SinkError::Encryption(e.to_string()))?;
    if raw.len() < NONCE_LEN {
        return Err(SinkError::Encryption("payload too short".into()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| SinkError::Encryption(e.to_string()))?;
    cipher
        .decrypt(nonce.into(), ct)
        .map_err(|e| SinkError::Encryption(e.to_string()))
}

/// Enum values are stored as their serde tag, e.g. "HARSH_BRAKING_SPIKE".
fn tag<T: serde::Serialize>(value: &T) -> Result<String, SinkError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn untag<T: serde::de::DeserializeOwned>(raw: String) -> Result<T, SinkError> {
    Ok(serde_json::from_value(serde_json::Value::String(raw))?)
}

fn ts_from_ms(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

struct StoredRow {
    id: String,
    subject_kind: String,
    subject_id: String,
    kind: String,
    severity: f64,
    risk_level: String,
    context_enc: String,
    detected_at: i64,
}

pub struct AnomalyStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl AnomalyStore {
    /// Open or create DB at path. Key is derived from `secret`.
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self, SinkError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS anomalies (
                id TEXT PRIMARY KEY,
                subject_kind TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                severity REAL NOT NULL,
                risk_level TEXT NOT NULL,
                context_enc TEXT NOT NULL,
                detected_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_anomalies_subject
                ON anomalies(subject_kind, subject_id, detected_at);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
        })
    }

    /// Insert a batch atomically (context stored encrypted).
    pub fn insert(&self, anomalies: &[AnomalyRecord]) -> Result<(), SinkError> {
        let mut rows = Vec::with_capacity(anomalies.len());
        for a in anomalies {
            rows.push((a, tag(&a.kind)?, tag(&a.risk_level)?, encrypt(&self.key, a.context.as_bytes())?));
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for (a, kind, risk, context_enc) in rows {
            tx.execute(
                "INSERT OR REPLACE INTO anomalies
                 (id, subject_kind, subject_id, kind, severity, risk_level, context_enc, detected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    a.id,
                    a.subject.kind.as_str(),
                    a.subject.id,
                    kind,
                    a.severity,
                    risk,
                    context_enc,
                    a.detected_at.timestamp_millis()
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Most recent anomalies for a subject, newest first (context decrypted).
    pub fn recent(&self, subject: &Subject, limit: usize) -> Result<Vec<AnomalyRecord>, SinkError> {
        let rows: Vec<StoredRow> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(
                "SELECT id, subject_kind, subject_id, kind, severity, risk_level, context_enc, detected_at
                 FROM anomalies
                 WHERE subject_kind = ?1 AND subject_id = ?2
                 ORDER BY detected_at DESC, rowid DESC
                 LIMIT ?3",
            )?;
            let mapped = stmt.query_map(
                params![subject.kind.as_str(), subject.id, limit as i64],
                |row| {
                    Ok(StoredRow {
                        id: row.get(0)?,
                        subject_kind: row.get(1)?,
                        subject_id: row.get(2)?,
                        kind: row.get(3)?,
                        severity: row.get(4)?,
                        risk_level: row.get(5)?,
                        context_enc: row.get(6)?,
                        detected_at: row.get(7)?,
                    })
                },
            )?;
            mapped.collect::<Result<_, _>>()?
        };

        rows.into_iter()
            .map(|r| {
                let context = String::from_utf8(decrypt(&self.key, &r.context_enc)?)
                    .map_err(|e| SinkError::Encryption(e.to_string()))?;
                Ok(AnomalyRecord {
                    id: r.id,
                    kind: untag(r.kind)?,
                    severity: r.severity,
                    risk_level: untag(r.risk_level)?,
                    context,
                    subject: Subject {
                        kind: untag(r.subject_kind)?,
                        id: r.subject_id,
                    },
                    detected_at: ts_from_ms(r.detected_at),
                })
            })
            .collect()
    }

    /// Retention: delete anomalies detected before `ts`.
    pub fn prune_before(&self, ts: DateTime<Utc>) -> Result<u64, SinkError> {
        let n = self
            .conn
            .lock()
            .execute("DELETE FROM anomalies WHERE detected_at < ?1", params![ts.timestamp_millis()])?;
        Ok(n as u64)
    }
}

impl AnomalySink for AnomalyStore {
    fn record_anomalies(&self, _subject: &Subject, anomalies: &[AnomalyRecord]) -> Result<(), SinkError> {
        self.insert(anomalies)
    }
}
