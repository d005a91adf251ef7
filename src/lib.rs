/// Bounding box geometry and timing helpers
pub mod utils;

/// Identity tracker that associates detections across frames
pub mod trackers;

/// Sticky violation alerts keyed by vehicle identity
pub mod alerts;

/// Per-frame orchestration around external detector and zone classifier
pub mod pipeline;

/// Box generators used by benches and demos
pub mod examples;

pub mod prelude;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Errors {
    #[error("Bounding box ({0}, {1}, {2}, {3}) is malformed: x1 < x2 and y1 < y2 are required.")]
    MalformedBoundingBox(i32, i32, i32, i32),
    #[error("Option `{0}` has invalid value: {1}")]
    InvalidOption(&'static str, String),
    #[error("Frame dropped: the worker queue is full.")]
    FrameDropped,
    #[error("Pipeline worker is not running.")]
    WorkerGone,
}
