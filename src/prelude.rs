pub use crate::alerts::{Alert, AlertManager};
pub use crate::trackers::greedy_iou::GreedyIoUTracker;
pub use crate::trackers::TrackedVehicle;
pub use crate::utils::bbox::BoundingBox;

pub use crate::pipeline::detection::{Detection, Detector, ObjectClass};
pub use crate::pipeline::notify::{Broadcaster, EventNotifier, NoopNotifier, PipelineEvent};
pub use crate::pipeline::options::PipelineOptions;
pub use crate::pipeline::report::{FrameReport, VehicleReport, VehicleStatus};
pub use crate::pipeline::violations::{
    MemoryViolationLog, ViolationLog, ViolationLogNotifier, ViolationRecord,
};
pub use crate::pipeline::worker::PipelineWorker;
pub use crate::pipeline::zone::{WeightedObjectClassifier, ZoneClassifier, ZoneLabel};
pub use crate::pipeline::{ParkingPipeline, ParkingPipelineBuilder};
