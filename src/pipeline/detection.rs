use crate::utils::bbox::BoundingBox;
use anyhow::Result;
use serde::{Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Raw object detection as produced by a detector
///
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Free-form class label
    pub class_name: String,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, class_name: &str, confidence: f32) -> Self {
        Self {
            bbox,
            class_name: class_name.to_string(),
            confidence,
        }
    }

    pub fn class(&self) -> ObjectClass {
        ObjectClass::from_label(&self.class_name)
    }
}

/// Object detector interface
///
/// Returns detections in a stable order for the frame; the order is used to
/// pair tracked identities with their class and confidence.
///
pub trait Detector<F> {
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>>;
}

impl<F, T> Detector<F> for T
where
    T: FnMut(&F) -> Result<Vec<Detection>>,
{
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>> {
        self(frame)
    }
}

/// Detector classes known to the pipeline
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Car,
    Motorcycle,
    Bus,
    Truck,
    Bicycle,
    /// Generic vehicle, used when the detector metadata is not available
    Vehicle,
    Unrecognized(String),
}

impl ObjectClass {
    pub fn from_label(label: &str) -> Self {
        match label {
            "car" => ObjectClass::Car,
            "motorcycle" => ObjectClass::Motorcycle,
            "bus" => ObjectClass::Bus,
            "truck" => ObjectClass::Truck,
            "bicycle" => ObjectClass::Bicycle,
            "vehicle" => ObjectClass::Vehicle,
            other => ObjectClass::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ObjectClass::Car => "car",
            ObjectClass::Motorcycle => "motorcycle",
            ObjectClass::Bus => "bus",
            ObjectClass::Truck => "truck",
            ObjectClass::Bicycle => "bicycle",
            ObjectClass::Vehicle => "vehicle",
            ObjectClass::Unrecognized(label) => label,
        }
    }

    /// Classes that take part in tracking
    ///
    pub fn is_vehicle(&self) -> bool {
        matches!(
            self,
            ObjectClass::Car
                | ObjectClass::Motorcycle
                | ObjectClass::Bus
                | ObjectClass::Truck
                | ObjectClass::Bicycle
        )
    }
}

impl FromStr for ObjectClass {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ObjectClass::from_label(s))
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ObjectClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Detection that passed the vehicle filter
///
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleDetection {
    pub bbox: BoundingBox,
    pub class: ObjectClass,
    pub confidence: f32,
}

/// Keeps vehicle detections with confidence strictly above the floor
///
pub fn filter_vehicles(detections: &[Detection], confidence_floor: f32) -> Vec<VehicleDetection> {
    detections
        .iter()
        .filter(|d| d.confidence > confidence_floor)
        .filter_map(|d| {
            let class = d.class();
            class.is_vehicle().then(|| VehicleDetection {
                bbox: d.bbox,
                class,
                confidence: d.confidence,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::pipeline::detection::{filter_vehicles, Detection, ObjectClass};
    use crate::utils::bbox::BoundingBox;

    #[test]
    fn labels() {
        for label in ["car", "motorcycle", "bus", "truck", "bicycle"] {
            let class: ObjectClass = label.parse().unwrap();
            assert!(class.is_vehicle());
            assert_eq!(class.as_str(), label);
        }
        assert!(!ObjectClass::Vehicle.is_vehicle());
        let person = ObjectClass::from_label("person");
        assert_eq!(person, ObjectClass::Unrecognized("person".into()));
        assert!(!person.is_vehicle());
        assert_eq!(person.to_string(), "person");
        assert_eq!(serde_json::to_string(&ObjectClass::Bus).unwrap(), "\"bus\"");
    }

    #[test]
    fn vehicle_filter() {
        let bb = BoundingBox::new(0, 0, 10, 10);
        let detections = vec![
            Detection::new(bb, "car", 0.9),
            Detection::new(bb, "person", 0.99),
            Detection::new(bb, "truck", 0.5),
            Detection::new(bb, "bicycle", 0.51),
            Detection::new(bb, "fire hydrant", 0.8),
        ];
        let vehicles = filter_vehicles(&detections, 0.5);
        assert_eq!(
            vehicles.iter().map(|v| v.class.clone()).collect::<Vec<_>>(),
            vec![ObjectClass::Car, ObjectClass::Bicycle]
        );
    }
}
