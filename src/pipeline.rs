use crate::alerts::AlertManager;
use crate::pipeline::detection::{filter_vehicles, Detector, ObjectClass, VehicleDetection};
use crate::pipeline::notify::{EventNotifier, NoopNotifier, PipelineEvent};
use crate::pipeline::options::PipelineOptions;
use crate::pipeline::report::{FrameReport, VehicleReport, VehicleStatus};
use crate::pipeline::violations::ViolationRecord;
use crate::pipeline::zone::{ZoneClassifier, ZoneLabel};
use crate::trackers::greedy_iou::GreedyIoUTracker;
use crate::trackers::TrackedVehicle;
use crate::utils::time::current_time_secs;
use anyhow::Result;
use itertools::Itertools;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

/// Detector output records and the vehicle filter
pub mod detection;

/// Zone labels and classifiers
pub mod zone;

/// Pipeline configuration
pub mod options;

/// Per-frame result records
pub mod report;

/// Event fan-out to viewers and storage
pub mod notify;

/// Violation records and their storage
pub mod violations;

/// Dedicated thread that drives a pipeline for one stream
pub mod worker;

#[cfg(test)]
mod pipeline_tests;

/// Confidence reported for vehicles without detector metadata
pub const PLACEHOLDER_CONFIDENCE: f32 = 0.8;

/// Frame orchestrator for a single stream
///
/// For every frame it asks the classifier for the zone label and the detector
/// for objects, feeds the vehicles into the tracker, evaluates alerts and
/// publishes the resulting events. Collaborator failures never stop the
/// stream: defaults are substituted and the frame is reported as degraded.
///
pub struct ParkingPipeline<D, C, N = NoopNotifier> {
    detector: D,
    classifier: C,
    notifier: N,
    tracker: GreedyIoUTracker,
    alerts: Arc<AlertManager>,
    opts: PipelineOptions,
    last_timestamp: Option<f64>,
}

impl<D, C, N> ParkingPipeline<D, C, N>
where
    N: EventNotifier,
{
    /// Creates new pipeline
    ///
    /// # Parameters
    /// * `detector` - object detector
    /// * `classifier` - zone classifier
    /// * `notifier` - receiver of frame, violation and reset events
    /// * `opts` - options, validated
    ///
    pub fn new(detector: D, classifier: C, notifier: N, opts: PipelineOptions) -> Result<Self> {
        opts.validate()?;
        Ok(Self {
            detector,
            classifier,
            notifier,
            tracker: GreedyIoUTracker::new(opts.iou_threshold),
            alerts: Arc::new(AlertManager::new()),
            opts,
            last_timestamp: None,
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    pub fn tracker(&self) -> &GreedyIoUTracker {
        &self.tracker
    }

    /// Shared handle to the alert set, safe to use from other threads
    ///
    pub fn alert_manager(&self) -> Arc<AlertManager> {
        self.alerts.clone()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Timestamp of the lastly processed frame
    ///
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Processes a frame stamped with the current wall clock
    ///
    pub fn process_frame_now<F>(&mut self, frame: &F) -> FrameReport
    where
        D: Detector<F>,
        C: ZoneClassifier<F>,
    {
        self.process_frame(frame, current_time_secs())
    }

    /// Processes a frame
    ///
    /// # Parameters
    /// * `frame` - the frame passed to the collaborators
    /// * `now` - frame timestamp in seconds; earlier than the previous frame or not finite values are clamped
    ///
    pub fn process_frame<F>(&mut self, frame: &F, now: f64) -> FrameReport
    where
        D: Detector<F>,
        C: ZoneClassifier<F>,
    {
        let started = Instant::now();
        let now = self.admit_timestamp(now);
        let mut failures = Vec::new();

        let zone_label = match self.classifier.classify(frame) {
            Ok(label) => label,
            Err(e) => {
                warn!(
                    "Zone classifier failed, {} is assumed. Error is: {:?}",
                    ZoneLabel::ParkingZone,
                    e
                );
                failures.push(format!("zone classifier: {}", e));
                ZoneLabel::ParkingZone
            }
        };

        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Detector failed, frame has no detections. Error is: {:?}", e);
                failures.push(format!("detector: {}", e));
                Vec::default()
            }
        };

        let vehicles = admit_vehicles(filter_vehicles(&detections, self.opts.confidence_floor));
        let boxes = vehicles.iter().map(|v| v.bbox).collect_vec();
        let is_no_parking_zone = zone_label.is_no_parking();

        let tracked = self.tracker.update(&boxes, now, is_no_parking_zone);
        let new_alerts = self.alerts.evaluate(
            &tracked,
            is_no_parking_zone,
            self.opts.alert_threshold_secs,
            now,
        );

        let vehicle_reports = tracked
            .iter()
            .map(|t| self.vehicle_report(t, &vehicles, is_no_parking_zone))
            .collect_vec();

        let report = FrameReport {
            zone_label,
            vehicles: vehicle_reports,
            alerts: self.alerts.all_alerts(),
            new_alerts,
            timestamp: now,
            processing_time: started.elapsed().as_secs_f64(),
            degraded: (!failures.is_empty()).then(|| failures.join("; ")),
        };

        debug!(
            "Frame at {:.3}: {}, {} vehicles, {} new alerts",
            now,
            zone_label,
            report.vehicles.len(),
            report.new_alerts.len()
        );

        for alert in &report.new_alerts {
            self.notifier.send(&PipelineEvent::NewViolation {
                data: ViolationRecord::from_alert(alert, &self.opts.location),
            });
        }
        self.notifier.send(&PipelineEvent::FrameProcessed {
            data: report.clone(),
        });

        report
    }

    /// Clears all the alerts and publishes the reset
    ///
    pub fn reset_alerts(&mut self) {
        self.alerts.reset();
        self.notifier.send(&PipelineEvent::AlertsReset {
            timestamp: current_time_secs(),
        });
    }

    fn admit_timestamp(&mut self, now: f64) -> f64 {
        let admitted = match self.last_timestamp {
            Some(last) if !now.is_finite() || now < last => {
                warn!(
                    "Frame timestamp {} precedes the previous one ({}), clamped",
                    now, last
                );
                last
            }
            None if !now.is_finite() => {
                warn!("Frame timestamp {} is not finite, wall clock is used", now);
                current_time_secs()
            }
            _ => now,
        };
        self.last_timestamp = Some(admitted);
        admitted
    }

    fn vehicle_report(
        &self,
        tracked: &TrackedVehicle,
        vehicles: &[VehicleDetection],
        is_no_parking_zone: bool,
    ) -> VehicleReport {
        let (class, confidence) = tracked
            .detection_index
            .and_then(|i| vehicles.get(i))
            .map(|v| (v.class.clone(), v.confidence))
            .unwrap_or((ObjectClass::Vehicle, PLACEHOLDER_CONFIDENCE));

        let status =
            if is_no_parking_zone && tracked.continuous_duration > self.opts.alert_threshold_secs {
                VehicleStatus::Violation
            } else {
                VehicleStatus::Normal
            };

        VehicleReport {
            id: tracked.id,
            bbox: tracked.bbox,
            class,
            confidence,
            duration: tracked.continuous_duration,
            status,
        }
    }
}

fn admit_vehicles(vehicles: Vec<VehicleDetection>) -> Vec<VehicleDetection> {
    vehicles
        .into_iter()
        .filter(|v| {
            let valid = v.bbox.is_valid();
            if !valid {
                warn!("Malformed {} box {:?} skipped", v.class, v.bbox);
            }
            valid
        })
        .collect()
}

/// Builder for ParkingPipeline
///
pub struct ParkingPipelineBuilder<D = (), C = (), N = NoopNotifier> {
    detector: D,
    classifier: C,
    notifier: N,
    opts: PipelineOptions,
}

impl Default for ParkingPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParkingPipelineBuilder {
    /// Creates a new builder with default options and no-op notifier
    ///
    pub fn new() -> Self {
        Self {
            detector: (),
            classifier: (),
            notifier: NoopNotifier,
            opts: PipelineOptions::default(),
        }
    }
}

impl<D, C, N> ParkingPipelineBuilder<D, C, N>
where
    N: EventNotifier,
{
    /// Sets the detector to use
    ///
    pub fn detector<D2>(self, detector: D2) -> ParkingPipelineBuilder<D2, C, N> {
        ParkingPipelineBuilder {
            detector,
            classifier: self.classifier,
            notifier: self.notifier,
            opts: self.opts,
        }
    }

    /// Sets the zone classifier to use
    ///
    pub fn classifier<C2>(self, classifier: C2) -> ParkingPipelineBuilder<D, C2, N> {
        ParkingPipelineBuilder {
            detector: self.detector,
            classifier,
            notifier: self.notifier,
            opts: self.opts,
        }
    }

    /// Sets the event notifier to use
    ///
    pub fn notifier<N2: EventNotifier>(self, notifier: N2) -> ParkingPipelineBuilder<D, C, N2> {
        ParkingPipelineBuilder {
            detector: self.detector,
            classifier: self.classifier,
            notifier,
            opts: self.opts,
        }
    }

    pub fn options(mut self, opts: PipelineOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Builds the pipeline, options are validated
    ///
    pub fn build(self) -> Result<ParkingPipeline<D, C, N>> {
        ParkingPipeline::new(self.detector, self.classifier, self.notifier, self.opts)
    }
}
