use crate::utils::bbox::BoundingBox;
use serde::Serialize;

/// Greedy IoU matching engine
///
pub mod voting;

/// Identity tracker with continuous no-parking presence timers
pub mod greedy_iou;

/// Default IoU threshold of the standalone tracker
pub const DEFAULT_TRACKER_IOU_THRESHOLD: f32 = 0.5;

/// Looser IoU threshold used by the frame pipeline to tolerate camera jitter
pub const DEFAULT_PIPELINE_IOU_THRESHOLD: f32 = 0.3;

/// Live vehicle identity as returned by the tracker for the current frame
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedVehicle {
    /// Identity, never reused within the tracker lifetime
    pub id: u64,
    /// Lastly matched box
    pub bbox: BoundingBox,
    /// Baseline for the next duration increment
    pub anchor_time: f64,
    /// Accumulated seconds of continuous no-parking zone presence
    pub continuous_duration: f64,
    /// Index of the detection the identity claimed or was spawned from during the last update
    #[serde(skip)]
    pub detection_index: Option<usize>,
}

impl TrackedVehicle {
    pub(crate) fn spawn(id: u64, bbox: BoundingBox, now: f64, detection_index: usize) -> Self {
        Self {
            id,
            bbox,
            anchor_time: now,
            continuous_duration: 0.0,
            detection_index: Some(detection_index),
        }
    }

    /// Moves the identity to the matched detection and advances its timer
    ///
    pub(crate) fn advance(
        &mut self,
        bbox: BoundingBox,
        detection_index: usize,
        now: f64,
        is_no_parking_zone: bool,
    ) {
        self.bbox = bbox;
        self.detection_index = Some(detection_index);
        if is_no_parking_zone {
            self.continuous_duration += now - self.anchor_time;
        } else {
            self.continuous_duration = 0.0;
        }
        self.anchor_time = now;
    }
}
