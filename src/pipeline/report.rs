use crate::alerts::Alert;
use crate::pipeline::detection::ObjectClass;
use crate::pipeline::zone::ZoneLabel;
use crate::utils::bbox::BoundingBox;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Normal,
    Violation,
}

/// Tracked vehicle paired with its detector metadata
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleReport {
    pub id: u64,
    pub bbox: BoundingBox,
    pub class: ObjectClass,
    pub confidence: f32,
    pub duration: f64,
    pub status: VehicleStatus,
}

/// Outcome of a single frame
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    #[serde(rename = "prediction")]
    pub zone_label: ZoneLabel,
    pub vehicles: Vec<VehicleReport>,
    /// The whole alert set after the frame
    pub alerts: Vec<Alert>,
    /// Alerts raised by this frame, each is reported exactly once
    #[serde(skip)]
    pub new_alerts: Vec<Alert>,
    pub timestamp: f64,
    /// Seconds spent on the frame, collaborators included
    pub processing_time: f64,
    /// Collaborator failure description when defaults were substituted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl FrameReport {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    pub fn violations(&self) -> impl Iterator<Item = &VehicleReport> {
        self.vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::Violation)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
