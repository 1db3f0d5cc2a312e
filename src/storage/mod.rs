//! Encrypted local ledger of detected anomalies.

mod encrypted;

pub use encrypted::AnomalyStore;
