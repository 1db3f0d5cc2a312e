//! Time-bounded event buffers: one per vehicle, created on first event.

use crate::config::WindowConfig;
use crate::telemetry::TelematicsEvent;
use chrono::Duration;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Rolling buffer for a single vehicle, ordered by timestamp.
///
/// Invariant: every retained event satisfies `newest.timestamp - e.timestamp <= max_age`.
/// Events exactly `max_age` older than the newest are kept.
#[derive(Debug, Clone)]
pub struct VehicleWindow {
    max_age: Duration,
    events: VecDeque<TelematicsEvent>,
}

impl VehicleWindow {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            events: VecDeque::new(),
        }
    }

    /// Insert in timestamp order, then evict from the oldest end. Returns evicted count.
    pub fn push(&mut self, event: TelematicsEvent) -> usize {
        let in_order = self
            .events
            .back()
            .map_or(true, |last| last.timestamp <= event.timestamp);
        if in_order {
            self.events.push_back(event);
        } else {
            // Late arrival: after any equal timestamps to keep arrival order among ties.
            let idx = self.events.partition_point(|e| e.timestamp <= event.timestamp);
            self.events.insert(idx, event);
        }
        self.evict()
    }

    fn evict(&mut self) -> usize {
        let Some(newest) = self.events.back().map(|e| e.timestamp) else {
            return 0;
        };
        let cutoff = newest - self.max_age;
        let mut evicted = 0;
        while self.events.front().is_some_and(|e| e.timestamp < cutoff) {
            self.events.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn snapshot(&self) -> Vec<TelematicsEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// All vehicle windows. Distinct vehicles never contend on the same buffer lock.
pub struct WindowStore {
    max_age: Duration,
    windows: RwLock<HashMap<String, Arc<Mutex<VehicleWindow>>>>,
}

impl WindowStore {
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            max_age: Duration::days(config.max_days),
            windows: RwLock::new(HashMap::new()),
        }
    }

    fn window_for(&self, vehicle_id: &str) -> Arc<Mutex<VehicleWindow>> {
        if let Some(w) = self.windows.read().get(vehicle_id) {
            return Arc::clone(w);
        }
        let mut map = self.windows.write();
        Arc::clone(
            map.entry(vehicle_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(VehicleWindow::new(self.max_age)))),
        )
    }

    /// Append `event` to the vehicle's window and return the window after eviction.
    pub fn add_event(&self, vehicle_id: &str, event: TelematicsEvent) -> Vec<TelematicsEvent> {
        let window = self.window_for(vehicle_id);
        let mut w = window.lock();
        let evicted = w.push(event);
        if evicted > 0 {
            debug!(vehicle_id, evicted, retained = w.len(), "evicted stale events");
        }
        w.snapshot()
    }

    /// Current window for a vehicle; empty if it has never reported.
    pub fn get_window(&self, vehicle_id: &str) -> Vec<TelematicsEvent> {
        self.windows
            .read()
            .get(vehicle_id)
            .map(|w| w.lock().snapshot())
            .unwrap_or_default()
    }

    pub fn vehicle_ids(&self) -> Vec<String> {
        self.windows.read().keys().cloned().collect()
    }

    /// Drop a vehicle's buffer entirely.
    pub fn remove(&self, vehicle_id: &str) -> bool {
        self.windows.write().remove(vehicle_id).is_some()
    }
}

impl Default for WindowStore {
    fn default() -> Self {
        Self::new(&WindowConfig::default())
    }
}
