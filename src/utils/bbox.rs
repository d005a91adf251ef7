use crate::Errors;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in the format (x1, y1, x2, y2)
///
/// Well-formed boxes satisfy `x1 < x2` and `y1 < y2`. On the wire the box is
/// an array `[x1, y1, x2, y2]`.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Constructor, the box is not checked
    ///
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Constructor that rejects boxes with zero or negative area
    ///
    pub fn try_new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self> {
        let bbox = Self::new(x1, y1, x2, y2);
        if bbox.is_valid() {
            Ok(bbox)
        } else {
            Err(Errors::MalformedBoundingBox(x1, y1, x2, y2).into())
        }
    }

    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    pub fn width(&self) -> i64 {
        i64::from(self.x2) - i64::from(self.x1)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.y2) - i64::from(self.y1)
    }

    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    /// Area of the overlapping region, 0 when the boxes are disjoint
    ///
    pub fn intersection(l: &BoundingBox, r: &BoundingBox) -> i64 {
        let x1 = i64::from(l.x1.max(r.x1));
        let y1 = i64::from(l.y1.max(r.y1));
        let x2 = i64::from(l.x2.min(r.x2));
        let y2 = i64::from(l.y2.min(r.y2));

        (x2 - x1).max(0) * (y2 - y1).max(0)
    }

    /// Intersection over union in `[0, 1]`
    ///
    /// Boxes are expected to be well-formed; a degenerate union yields 0.
    ///
    pub fn iou(l: &BoundingBox, r: &BoundingBox) -> f32 {
        let intersection = Self::intersection(l, r);
        let union = l.area() + r.area() - intersection;
        if union <= 0 {
            return 0.0;
        }
        (intersection as f64 / union as f64) as f32
    }
}

/// Intersection over union for two boxes
///
pub fn iou(l: &BoundingBox, r: &BoundingBox) -> f32 {
    BoundingBox::iou(l, r)
}

impl From<[i32; 4]> for BoundingBox {
    fn from(v: [i32; 4]) -> Self {
        BoundingBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}
