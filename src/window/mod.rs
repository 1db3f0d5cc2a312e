//! Per-vehicle rolling buffers of telemetry, bounded by age.

mod store;

pub use store::{VehicleWindow, WindowStore};
