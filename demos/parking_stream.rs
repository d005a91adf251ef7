use anyhow::Result;
use log::info;
use parkwatch::examples::{BoxGen, DetectionGen};
use parkwatch::prelude::{
    Broadcaster, Detection, MemoryViolationLog, ParkingPipelineBuilder, PipelineEvent,
    PipelineOptions, PipelineWorker, ViolationLog, ViolationLogNotifier, WeightedObjectClassifier,
};
use parkwatch::utils::bbox::BoundingBox;
use std::thread;

/// Simulated camera frame: what the detector would see in it
///
struct Scene {
    objects: Vec<Detection>,
    landmarks: Vec<Detection>,
}

fn detect_objects(scene: &Scene) -> Result<Vec<Detection>> {
    Ok(scene.objects.clone())
}

fn detect_landmarks(scene: &Scene) -> Result<Vec<Detection>> {
    Ok(scene.landmarks.clone())
}

fn main() -> Result<()> {
    env_logger::init();

    let opts = PipelineOptions::default()
        .with_location("Aavin")
        .with_alert_threshold_secs(3.0);

    let broadcaster = Broadcaster::from_options(&opts);
    let events = broadcaster.subscribe();
    let violations = MemoryViolationLog::new();

    let pipeline = ParkingPipelineBuilder::new()
        .detector(detect_objects)
        .classifier(WeightedObjectClassifier::new(detect_landmarks))
        .notifier((broadcaster, ViolationLogNotifier::new(violations.clone())))
        .options(opts)
        .build()?;

    let printer = thread::spawn(move || {
        for event in events.iter() {
            if let PipelineEvent::FrameProcessed { data } = &event {
                if data.vehicles.is_empty() {
                    continue;
                }
            }
            match serde_json::to_string(&event) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Unable to serialize event: {:?}", e),
            }
        }
    });

    let worker = PipelineWorker::spawn(pipeline, 8);

    let mut parked = DetectionGen::new(
        BoxGen::new(100.0, 100.0, 120.0, 80.0, 0.5, 0.2),
        "car",
        0.7,
    );
    // shows up every third frame only, so its identity never lives long
    let mut passing = DetectionGen::new(
        BoxGen::new(600.0, 300.0, 60.0, 40.0, 1.0, 0.2),
        "motorcycle",
        0.6,
    );
    let sign = Detection::new(BoundingBox::new(20, 20, 40, 60), "no-parking sign", 0.9);

    for frame in 0..20 {
        let now = frame as f64 * 0.5;
        let mut objects = parked.next().into_iter().collect::<Vec<_>>();
        if frame % 3 == 0 {
            objects.extend(passing.next());
        }
        let scene = Scene {
            objects,
            landmarks: vec![sign.clone()],
        };
        worker.submit_blocking(scene, now)?;
    }
    worker.reset_alerts()?;

    drop(worker);
    printer
        .join()
        .map_err(|_| anyhow::anyhow!("Event printer panicked"))?;

    for v in violations.latest()? {
        info!(
            "Vehicle #{} parked at {} for {:.1}s",
            v.vehicle_id, v.location, v.duration
        );
    }
    Ok(())
}
