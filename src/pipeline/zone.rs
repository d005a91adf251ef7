use crate::pipeline::detection::Detector;
use anyhow::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Binary zone label of a frame
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ZoneLabel {
    /// Non-alerting label, also used when the classifier fails
    #[default]
    #[serde(rename = "Parking Zone")]
    ParkingZone,
    #[serde(rename = "No Parking Zone")]
    NoParkingZone,
}

impl ZoneLabel {
    pub fn is_no_parking(&self) -> bool {
        matches!(self, ZoneLabel::NoParkingZone)
    }
}

impl fmt::Display for ZoneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneLabel::ParkingZone => f.write_str("Parking Zone"),
            ZoneLabel::NoParkingZone => f.write_str("No Parking Zone"),
        }
    }
}

/// Zone classifier interface
///
pub trait ZoneClassifier<F> {
    fn classify(&mut self, frame: &F) -> Result<ZoneLabel>;
}

impl<F, T> ZoneClassifier<F> for T
where
    T: FnMut(&F) -> Result<ZoneLabel>,
{
    fn classify(&mut self, frame: &F) -> Result<ZoneLabel> {
        self(frame)
    }
}

/// Contribution of detected objects to the parking score
///
/// Positive weights indicate a parking area, negative ones indicate places where
/// parking is not allowed.
///
pub static OBJECT_WEIGHTS: Lazy<HashMap<&'static str, f32>> = Lazy::new(|| {
    HashMap::from([
        ("car", 5.0),
        ("motorcycle", 6.0),
        ("parking meter", 6.0),
        ("bus", 5.0),
        ("truck", 5.0),
        ("bicycle", 3.0),
        ("road", -2.0),
        ("person", -1.0),
        ("building", -0.5),
        ("footpath", -0.5),
        ("sign", -0.25),
        ("traffic light", -0.5),
        ("fire hydrant", -1.0),
        ("stop sign", -1.0),
        ("parking area", 5.0),
        ("no-parking sign", -3.0),
    ])
});

/// Sum of object weights, unknown labels weigh nothing
///
pub fn parking_score<'a, I>(labels: I) -> f32
where
    I: IntoIterator<Item = &'a str>,
{
    labels
        .into_iter()
        .map(|l| OBJECT_WEIGHTS.get(l).copied().unwrap_or(0.0))
        .sum()
}

/// Model-free zone classifier
///
/// Runs a detector over the whole frame and labels the frame a parking zone when
/// the parking score of all the detected objects is positive.
///
pub struct WeightedObjectClassifier<D> {
    detector: D,
}

impl<D> WeightedObjectClassifier<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }
}

impl<F, D> ZoneClassifier<F> for WeightedObjectClassifier<D>
where
    D: Detector<F>,
{
    fn classify(&mut self, frame: &F) -> Result<ZoneLabel> {
        let detections = self.detector.detect(frame)?;
        let score = parking_score(detections.iter().map(|d| d.class_name.as_str()));
        Ok(if score > 0.0 {
            ZoneLabel::ParkingZone
        } else {
            ZoneLabel::NoParkingZone
        })
    }
}
