//! Structured logging setup and ndjson line format.

mod format;

pub use format::{LogEvent, StructuredLogger};
