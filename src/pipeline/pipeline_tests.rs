use crate::pipeline::detection::{Detection, ObjectClass};
use crate::pipeline::notify::{Broadcaster, EventNotifier, NoopNotifier, PipelineEvent};
use crate::pipeline::options::PipelineOptions;
use crate::pipeline::report::VehicleStatus;
use crate::pipeline::violations::{MemoryViolationLog, ViolationLog, ViolationLogNotifier};
use crate::pipeline::zone::ZoneLabel;
use crate::pipeline::{ParkingPipeline, ParkingPipelineBuilder};
use crate::utils::bbox::BoundingBox;
use anyhow::{anyhow, Result};

const EPS: f64 = 0.00001;

/// Scripted frame, `None` makes the collaborator fail
#[derive(Clone)]
struct Scene {
    zone: Option<ZoneLabel>,
    detections: Option<Vec<Detection>>,
}

impl Scene {
    fn new(zone: ZoneLabel, detections: Vec<Detection>) -> Self {
        Self {
            zone: Some(zone),
            detections: Some(detections),
        }
    }
}

fn scripted_detector(scene: &Scene) -> Result<Vec<Detection>> {
    scene
        .detections
        .clone()
        .ok_or_else(|| anyhow!("detector timed out"))
}

fn scripted_classifier(scene: &Scene) -> Result<ZoneLabel> {
    scene.zone.ok_or_else(|| anyhow!("classifier is not loaded"))
}

type ScriptedPipeline<N> = ParkingPipeline<
    fn(&Scene) -> Result<Vec<Detection>>,
    fn(&Scene) -> Result<ZoneLabel>,
    N,
>;

fn pipeline_with<N: EventNotifier>(
    notifier: N,
    opts: PipelineOptions,
) -> ScriptedPipeline<N> {
    ParkingPipelineBuilder::new()
        .detector(scripted_detector as fn(&Scene) -> Result<Vec<Detection>>)
        .classifier(scripted_classifier as fn(&Scene) -> Result<ZoneLabel>)
        .notifier(notifier)
        .options(opts)
        .build()
        .unwrap()
}

fn car(bbox: BoundingBox) -> Detection {
    Detection::new(bbox, "car", 0.9)
}

fn parked_car() -> BoundingBox {
    BoundingBox::new(100, 100, 200, 200)
}

#[test]
fn six_frames_one_second_apart() {
    let mut p = pipeline_with(NoopNotifier, PipelineOptions::default());
    let scene = Scene::new(ZoneLabel::NoParkingZone, vec![car(parked_car())]);

    for frame in 0..6 {
        let report = p.process_frame(&scene, frame as f64);
        assert_eq!(report.vehicles.len(), 1);
        assert_eq!(report.vehicles[0].id, 0);
        assert!((report.vehicles[0].duration - frame as f64).abs() < EPS);
        // 5s is not above the 5s threshold
        assert!(report.alerts.is_empty());
        assert_eq!(report.vehicles[0].status, VehicleStatus::Normal);
    }

    let report = p.process_frame(&scene, 6.0);
    assert_eq!(report.new_alerts.len(), 1);
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].vehicle_id, 0);
    assert_eq!(report.vehicles[0].status, VehicleStatus::Violation);
}

#[test]
fn six_frames_with_capture_jitter() {
    let mut p = pipeline_with(NoopNotifier, PipelineOptions::default());
    let scene = Scene::new(ZoneLabel::NoParkingZone, vec![car(parked_car())]);

    // frames are captured slightly later than the nominal second
    let stamps = [100.0, 101.002, 102.004, 103.006, 104.008, 105.010];
    let reports = stamps
        .iter()
        .map(|now| p.process_frame(&scene, *now))
        .collect::<Vec<_>>();

    for report in &reports[..5] {
        assert!(report.alerts.is_empty());
    }
    let last = &reports[5];
    assert_eq!(last.alerts.len(), 1);
    assert_eq!(last.alerts[0].vehicle_id, 0);
    assert!((last.alerts[0].duration - 5.01).abs() < 0.0001);
    assert_eq!(
        last.alerts[0].text,
        "VIOLATION: Vehicle #0 in no-parking zone for 5.0s"
    );
    assert!((last.alerts[0].created_at - 105.010).abs() < EPS);
}

#[test]
fn alerts_are_reported_once_and_stay() {
    let log = MemoryViolationLog::new();
    let broadcaster = Broadcaster::new(128);
    let rx = broadcaster.subscribe();
    let mut p = pipeline_with(
        (broadcaster, ViolationLogNotifier::new(log.clone())),
        PipelineOptions::default().with_location("AB-1"),
    );
    let scene = Scene::new(ZoneLabel::NoParkingZone, vec![car(parked_car())]);

    for now in 0..10 {
        p.process_frame(&scene, now as f64);
    }
    // the vehicle leaves, its alert stays until acknowledged
    let report = p.process_frame(&Scene::new(ZoneLabel::NoParkingZone, vec![]), 10.0);
    assert!(report.vehicles.is_empty());
    assert_eq!(report.alerts.len(), 1);
    assert!((report.alerts[0].duration - 9.0).abs() < EPS);

    let violations = log.recent(100).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].vehicle_id, 0);
    assert_eq!(violations[0].location, "AB-1");
    assert!((violations[0].timestamp - 6.0).abs() < EPS);

    let events = rx.try_iter().collect::<Vec<_>>();
    let frames = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::FrameProcessed { .. }))
        .count();
    let onsets = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::NewViolation { .. }))
        .count();
    assert_eq!(frames, 11);
    assert_eq!(onsets, 1);

    p.reset_alerts();
    assert!(p.alert_manager().is_empty());
    assert!(matches!(
        rx.try_recv().unwrap(),
        PipelineEvent::AlertsReset { .. }
    ));
    p.reset_alerts();
    assert!(p.alert_manager().all_alerts().is_empty());
}

#[test]
fn zone_exit_resets_duration() {
    let mut p = pipeline_with(NoopNotifier, PipelineOptions::default());
    let detections = vec![car(parked_car())];
    for now in 0..=10 {
        p.process_frame(
            &Scene::new(ZoneLabel::NoParkingZone, detections.clone()),
            now as f64,
        );
    }
    let report = p.process_frame(&Scene::new(ZoneLabel::ParkingZone, detections), 11.0);
    assert_eq!(report.vehicles[0].id, 0);
    assert_eq!(report.vehicles[0].duration, 0.0);
    assert_eq!(report.vehicles[0].status, VehicleStatus::Normal);
    assert_eq!(report.zone_label, ZoneLabel::ParkingZone);
    // the onset at 6s is sticky
    assert_eq!(report.alerts.len(), 1);
}

#[test]
fn detections_are_filtered_and_paired() {
    let mut p = pipeline_with(NoopNotifier, PipelineOptions::default());
    let a = BoundingBox::new(0, 0, 100, 100);
    let b = BoundingBox::new(300, 0, 400, 100);
    let c = BoundingBox::new(600, 0, 700, 100);

    let first = Scene::new(
        ZoneLabel::ParkingZone,
        vec![
            Detection::new(a, "car", 0.9),
            Detection::new(b, "person", 0.99),
            Detection::new(b, "truck", 0.7),
            Detection::new(c, "bus", 0.4),
        ],
    );
    let report = p.process_frame(&first, 0.0);
    assert_eq!(report.vehicles.len(), 2);
    assert_eq!(report.vehicles[0].class, ObjectClass::Car);
    assert_eq!(report.vehicles[1].class, ObjectClass::Truck);
    assert_eq!(report.vehicles[1].bbox, b);

    // detections come in a different order, metadata follows the boxes
    let second = Scene::new(
        ZoneLabel::ParkingZone,
        vec![
            Detection::new(c, "motorcycle", 0.6),
            Detection::new(b, "truck", 0.75),
            Detection::new(a, "car", 0.95),
        ],
    );
    let report = p.process_frame(&second, 1.0);
    let summary = report
        .vehicles
        .iter()
        .map(|v| (v.id, v.class.clone(), v.confidence))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            (0, ObjectClass::Car, 0.95),
            (1, ObjectClass::Truck, 0.75),
            (2, ObjectClass::Motorcycle, 0.6),
        ]
    );
}

#[test]
fn malformed_boxes_never_reach_the_tracker() {
    let mut p = pipeline_with(NoopNotifier, PipelineOptions::default());
    let scene = Scene::new(
        ZoneLabel::NoParkingZone,
        vec![
            car(BoundingBox::new(50, 50, 50, 80)),
            car(BoundingBox::new(90, 10, 10, 90)),
            car(parked_car()),
        ],
    );
    let report = p.process_frame(&scene, 0.0);
    assert_eq!(report.vehicles.len(), 1);
    assert_eq!(report.vehicles[0].bbox, parked_car());
    assert_eq!(report.vehicles[0].confidence, 0.9);
    assert_eq!(p.tracker().len(), 1);
}

#[test]
fn timestamps_going_back_are_clamped() {
    let mut p = pipeline_with(NoopNotifier, PipelineOptions::default());
    let scene = Scene::new(ZoneLabel::NoParkingZone, vec![car(parked_car())]);
    p.process_frame(&scene, 10.0);
    p.process_frame(&scene, 12.0);
    let report = p.process_frame(&scene, 11.0);
    assert_eq!(report.timestamp, 12.0);
    assert!((report.vehicles[0].duration - 2.0).abs() < EPS);
    let report = p.process_frame(&scene, f64::NAN);
    assert_eq!(report.timestamp, 12.0);
    assert_eq!(p.last_timestamp(), Some(12.0));
    let report = p.process_frame(&scene, 13.0);
    assert!((report.vehicles[0].duration - 3.0).abs() < EPS);
}

#[test]
fn classifier_failure_defaults_to_parking_zone() {
    let mut p = pipeline_with(NoopNotifier, PipelineOptions::default());
    for now in 0..8 {
        p.process_frame(
            &Scene::new(ZoneLabel::NoParkingZone, vec![car(parked_car())]),
            now as f64,
        );
    }
    let broken = Scene {
        zone: None,
        detections: Some(vec![car(parked_car())]),
    };
    let report = p.process_frame(&broken, 8.0);
    assert_eq!(report.zone_label, ZoneLabel::ParkingZone);
    assert!(report.is_degraded());
    assert!(report
        .degraded
        .as_ref()
        .unwrap()
        .contains("classifier is not loaded"));
    assert_eq!(report.vehicles.len(), 1);
    assert_eq!(report.vehicles[0].duration, 0.0);
    assert_eq!(report.violations().count(), 0);
}

#[test]
fn detector_failure_yields_empty_frame() {
    let mut p = pipeline_with(NoopNotifier, PipelineOptions::default());
    let scene = Scene::new(ZoneLabel::NoParkingZone, vec![car(parked_car())]);
    p.process_frame(&scene, 0.0);
    p.process_frame(&scene, 1.0);

    let broken = Scene {
        zone: None,
        detections: None,
    };
    let report = p.process_frame(&broken, 2.0);
    assert_eq!(report.zone_label, ZoneLabel::ParkingZone);
    assert!(report.vehicles.is_empty());
    let degraded = report.degraded.clone().unwrap();
    assert!(degraded.contains("detector timed out"));
    assert!(degraded.contains("classifier is not loaded"));
    assert!(report.to_json().unwrap().contains("\"degraded\""));

    // the gap cost the vehicle its identity
    let report = p.process_frame(&scene, 3.0);
    assert_eq!(report.vehicles[0].id, 1);
    assert!(!report.is_degraded());
}

#[test]
fn confidence_floor_and_threshold_come_from_options() {
    let opts = PipelineOptions::from_json_str(
        r#"{"confidence_floor": 0.8, "alert_threshold_secs": 1.0, "iou_threshold": 0.9}"#,
    )
    .unwrap();
    let mut p = pipeline_with(NoopNotifier, opts);
    assert_eq!(p.tracker().iou_threshold(), 0.9);

    let weak = Scene::new(
        ZoneLabel::NoParkingZone,
        vec![Detection::new(parked_car(), "car", 0.75)],
    );
    assert!(p.process_frame(&weak, 0.0).vehicles.is_empty());

    let strong = Scene::new(ZoneLabel::NoParkingZone, vec![car(parked_car())]);
    p.process_frame(&strong, 1.0);
    p.process_frame(&strong, 2.0);
    let report = p.process_frame(&strong, 3.0);
    assert_eq!(report.new_alerts.len(), 1);

    // shifted by 10 pixels: IoU is below 0.9, a new identity appears
    let shifted = Scene::new(
        ZoneLabel::NoParkingZone,
        vec![car(BoundingBox::new(110, 100, 210, 200))],
    );
    let report = p.process_frame(&shifted, 4.0);
    assert_eq!(report.vehicles[0].id, 1);
}

#[test]
fn invalid_options_are_rejected() {
    let r = ParkingPipelineBuilder::new()
        .detector(scripted_detector as fn(&Scene) -> Result<Vec<Detection>>)
        .classifier(scripted_classifier as fn(&Scene) -> Result<ZoneLabel>)
        .options(PipelineOptions::default().with_confidence_floor(-0.1))
        .build();
    assert!(r.is_err());
}
