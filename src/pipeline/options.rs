use crate::trackers::DEFAULT_PIPELINE_IOU_THRESHOLD;
use crate::Errors;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Default continuous duration after which a vehicle is in violation
pub const DEFAULT_ALERT_THRESHOLD_SECS: f64 = 5.0;

/// Default minimal detector confidence, detections must exceed it
pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.5;

/// Default capacity of per-subscriber event queues
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 64;

/// Frame pipeline configuration
///
/// Every key is optional in the JSON form, omitted keys take the defaults.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOptions {
    /// IoU a detection must exceed to continue an identity
    pub iou_threshold: f32,
    /// Detections with confidence not above the floor are ignored
    pub confidence_floor: f32,
    /// Continuous no-parking duration that must be exceeded to raise an alert
    pub alert_threshold_secs: f64,
    /// Camera or area name reported in violation records
    pub location: String,
    /// Capacity of event queues created for subscribers
    pub event_queue_capacity: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_PIPELINE_IOU_THRESHOLD,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            alert_threshold_secs: DEFAULT_ALERT_THRESHOLD_SECS,
            location: "unknown".to_string(),
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl PipelineOptions {
    pub fn with_iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn with_confidence_floor(mut self, confidence_floor: f32) -> Self {
        self.confidence_floor = confidence_floor;
        self
    }

    pub fn with_alert_threshold_secs(mut self, alert_threshold_secs: f64) -> Self {
        self.alert_threshold_secs = alert_threshold_secs;
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(
                Errors::InvalidOption("iou_threshold", self.iou_threshold.to_string()).into(),
            );
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(Errors::InvalidOption(
                "confidence_floor",
                self.confidence_floor.to_string(),
            )
            .into());
        }
        if !self.alert_threshold_secs.is_finite() || self.alert_threshold_secs < 0.0 {
            return Err(Errors::InvalidOption(
                "alert_threshold_secs",
                self.alert_threshold_secs.to_string(),
            )
            .into());
        }
        if self.event_queue_capacity == 0 {
            return Err(Errors::InvalidOption("event_queue_capacity", "0".to_string()).into());
        }
        Ok(())
    }

    /// Parses and validates options from JSON
    ///
    pub fn from_json_str(json: &str) -> Result<Self> {
        let opts: PipelineOptions = serde_json::from_str(json)?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reads and validates options from a JSON source
    ///
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let opts: PipelineOptions = serde_json::from_reader(reader)?;
        opts.validate()?;
        Ok(opts)
    }
}
