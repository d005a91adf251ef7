use crate::trackers::TrackedVehicle;
use crate::utils::bbox::BoundingBox;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Violation alert for a single vehicle identity
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub vehicle_id: u64,
    pub text: String,
    /// Box captured at alert onset
    pub bbox: BoundingBox,
    /// Onset time in seconds
    #[serde(rename = "timestamp")]
    pub created_at: f64,
    /// Latest known continuous duration
    pub duration: f64,
}

impl Alert {
    fn new(vehicle: &TrackedVehicle, created_at: f64) -> Self {
        Self {
            vehicle_id: vehicle.id,
            text: format!(
                "VIOLATION: Vehicle #{} in no-parking zone for {:.1}s",
                vehicle.id, vehicle.continuous_duration
            ),
            bbox: vehicle.bbox,
            created_at,
            duration: vehicle.continuous_duration,
        }
    }
}

#[derive(Debug, Default)]
struct AlertSet {
    order: Vec<u64>,
    alerts: HashMap<u64, Alert>,
}

/// Owner of the sticky alert set
///
/// An alert is created once per vehicle identity, refreshed in place while the
/// violation lasts and survives the identity itself. Only [`AlertManager::reset`]
/// removes alerts. All operations lock the same mutex, so a reset issued from a
/// control thread never interleaves with an evaluation.
///
#[derive(Debug, Default)]
pub struct AlertManager {
    set: Mutex<AlertSet>,
}

impl AlertManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<AlertSet> {
        self.set
            .lock()
            .expect("Access to the alert set must always succeed")
    }

    /// Creates alerts for the vehicles crossing the threshold
    ///
    /// # Parameters
    /// * `vehicles` - tracker snapshot of the current frame
    /// * `is_no_parking_zone` - zone label of the current frame
    /// * `threshold_secs` - continuous duration that must be exceeded
    /// * `now` - frame timestamp, becomes the onset time of new alerts
    ///
    /// Returns only the alerts created by this call.
    ///
    pub fn evaluate(
        &self,
        vehicles: &[TrackedVehicle],
        is_no_parking_zone: bool,
        threshold_secs: f64,
        now: f64,
    ) -> Vec<Alert> {
        if !is_no_parking_zone {
            return Vec::default();
        }

        let mut set = self.lock();
        let mut created = Vec::default();

        for v in vehicles
            .iter()
            .filter(|v| v.continuous_duration > threshold_secs)
        {
            if let Some(alert) = set.alerts.get_mut(&v.id) {
                alert.duration = v.continuous_duration;
                debug!("Alert for vehicle #{} refreshed: {:.1}s", v.id, alert.duration);
                continue;
            }

            let alert = Alert::new(v, now);
            info!("{}", alert.text);
            set.order.push(v.id);
            set.alerts.insert(v.id, alert.clone());
            created.push(alert);
        }

        created
    }

    /// All the alerts in onset order
    ///
    pub fn all_alerts(&self) -> Vec<Alert> {
        let set = self.lock();
        set.order
            .iter()
            .filter_map(|id| set.alerts.get(id))
            .cloned()
            .collect()
    }

    pub fn get(&self, vehicle_id: u64) -> Option<Alert> {
        self.lock().alerts.get(&vehicle_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().alerts.is_empty()
    }

    /// Removes all the alerts at once
    ///
    pub fn reset(&self) {
        let mut set = self.lock();
        let cleared = set.alerts.len();
        set.alerts.clear();
        set.order.clear();
        info!("Alerts reset, {} cleared", cleared);
    }
}
