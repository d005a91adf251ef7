use crate::alerts::Alert;
use crate::pipeline::notify::{EventNotifier, PipelineEvent};
use anyhow::Result;
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

pub const NO_PARKING_ZONE_VIOLATION: &str = "no_parking_zone";

/// Default number of records returned by listings
pub const DEFAULT_RECENT_LIMIT: usize = 100;

/// Persistent record of a violation onset
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub vehicle_id: u64,
    pub location: String,
    pub timestamp: f64,
    pub duration: f64,
    pub violation_type: String,
}

impl ViolationRecord {
    pub fn from_alert(alert: &Alert, location: &str) -> Self {
        Self {
            vehicle_id: alert.vehicle_id,
            location: location.to_string(),
            timestamp: alert.created_at,
            duration: alert.duration,
            violation_type: NO_PARKING_ZONE_VIOLATION.to_string(),
        }
    }
}

/// Violation storage
///
pub trait ViolationLog {
    fn record(&self, violation: &ViolationRecord) -> Result<()>;

    /// Newest records first
    ///
    fn recent(&self, limit: usize) -> Result<Vec<ViolationRecord>>;

    /// Newest [`DEFAULT_RECENT_LIMIT`] records
    ///
    fn latest(&self) -> Result<Vec<ViolationRecord>> {
        self.recent(DEFAULT_RECENT_LIMIT)
    }
}

/// In-process violation storage, clones share the records
///
#[derive(Debug, Clone, Default)]
pub struct MemoryViolationLog {
    records: Arc<Mutex<Vec<ViolationRecord>>>,
}

impl MemoryViolationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .expect("Access to violation records must always succeed")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ViolationLog for MemoryViolationLog {
    fn record(&self, violation: &ViolationRecord) -> Result<()> {
        self.records
            .lock()
            .expect("Access to violation records must always succeed")
            .push(violation.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ViolationRecord>> {
        let records = self
            .records
            .lock()
            .expect("Access to violation records must always succeed");
        Ok(records
            .iter()
            .enumerate()
            .sorted_by(|(li, l), (ri, r)| {
                r.timestamp
                    .total_cmp(&l.timestamp)
                    .then_with(|| ri.cmp(li))
            })
            .take(limit)
            .map(|(_, r)| r.clone())
            .collect())
    }
}

/// Event notifier that persists every violation onset
///
/// Storage failures are logged and never reach the frame pipeline.
///
#[derive(Debug, Clone, Default)]
pub struct ViolationLogNotifier<L> {
    log: L,
}

impl<L: ViolationLog> ViolationLogNotifier<L> {
    pub fn new(log: L) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &L {
        &self.log
    }
}

impl<L: ViolationLog> EventNotifier for ViolationLogNotifier<L> {
    fn send(&mut self, event: &PipelineEvent) {
        if let PipelineEvent::NewViolation { data } = event {
            if let Err(e) = self.log.record(data) {
                warn!(
                    "Unable to persist violation of vehicle #{}. Error is: {:?}",
                    data.vehicle_id, e
                );
            }
        }
    }
}
