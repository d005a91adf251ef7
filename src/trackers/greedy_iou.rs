use crate::trackers::voting::{GreedyIoUVoting, Voting};
use crate::trackers::{TrackedVehicle, DEFAULT_TRACKER_IOU_THRESHOLD};
use crate::utils::bbox::BoundingBox;
use log::{debug, trace};
use std::mem;

/// Frame-to-frame vehicle identity tracker
///
/// Keeps only the identities of the previous frame. Every identity that does
/// not claim a detection in the current frame is dropped for good, so a single
/// missed frame yields a new identity when the vehicle shows up again.
///
/// The tracker is not synchronized: one instance serves one stream.
///
#[derive(Debug, Clone)]
pub struct GreedyIoUTracker {
    tracked: Vec<TrackedVehicle>,
    next_id: u64,
    voting: GreedyIoUVoting,
}

impl Default for GreedyIoUTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKER_IOU_THRESHOLD)
    }
}

impl GreedyIoUTracker {
    /// Creates new tracker
    ///
    /// # Parameters
    /// * `iou_threshold` - IoU a detection must exceed to continue an existing identity
    ///
    pub fn new(iou_threshold: f32) -> Self {
        Self {
            tracked: Vec::default(),
            next_id: 0,
            voting: GreedyIoUVoting::new(iou_threshold),
        }
    }

    pub fn iou_threshold(&self) -> f32 {
        self.voting.threshold()
    }

    /// Identity that will be assigned to the next new vehicle
    ///
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Identities alive after the last update, in tracker order
    ///
    pub fn tracked(&self) -> &[TrackedVehicle] {
        &self.tracked
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Associates the detections of a new frame with the live identities
    ///
    /// # Parameters
    /// * `detections` - well-formed boxes of the current frame
    /// * `now` - frame timestamp in seconds, must not decrease between calls
    /// * `is_no_parking_zone` - whether the frame is classified as a no-parking zone
    ///
    /// Returns the snapshot of live identities: continued identities in tracker
    /// order followed by new identities in detection order.
    ///
    pub fn update(
        &mut self,
        detections: &[BoundingBox],
        now: f64,
        is_no_parking_zone: bool,
    ) -> Vec<TrackedVehicle> {
        let previous = mem::take(&mut self.tracked);

        if detections.is_empty() {
            for v in &previous {
                debug!(
                    "Vehicle #{} lost: frame without detections, accumulated {:.1}s",
                    v.id, v.continuous_duration
                );
            }
            return Vec::default();
        }

        let track_boxes = previous.iter().map(|v| v.bbox).collect::<Vec<_>>();
        let winners = self.voting.winners(&track_boxes, detections);

        let mut claimed = vec![false; detections.len()];
        let mut current = Vec::with_capacity(detections.len());

        for (mut vehicle, winner) in previous.into_iter().zip(winners) {
            match winner {
                Some(index) => {
                    claimed[index] = true;
                    vehicle.advance(detections[index], index, now, is_no_parking_zone);
                    trace!(
                        "Vehicle #{} matched detection {}, duration {:.2}s",
                        vehicle.id,
                        index,
                        vehicle.continuous_duration
                    );
                    current.push(vehicle);
                }
                None => {
                    debug!(
                        "Vehicle #{} lost: no detection above IoU {}",
                        vehicle.id,
                        self.voting.threshold()
                    );
                }
            }
        }

        for (index, bbox) in detections.iter().enumerate() {
            if claimed[index] {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            debug!("Vehicle #{} spawned at {:?}", id, bbox);
            current.push(TrackedVehicle::spawn(id, *bbox, now, index));
        }

        self.tracked = current;
        self.tracked.clone()
    }
}
