use crate::pipeline::detection::Detection;
use crate::utils::bbox::BoundingBox;
use rand::distributions::Uniform;
use rand::prelude::ThreadRng;
use rand::Rng;

/// Generator of a jittering box around a slowly drifting position
///
pub struct BoxGen {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    gen: ThreadRng,
    dist_pos: Uniform<f32>,
    dist_box: Uniform<f32>,
}

impl BoxGen {
    pub fn new(x: f32, y: f32, width: f32, height: f32, pos_drift: f32, box_drift: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            gen: rand::thread_rng(),
            dist_pos: Uniform::new_inclusive(-pos_drift, pos_drift),
            dist_box: Uniform::new_inclusive(-box_drift, box_drift),
        }
    }
}

impl Iterator for BoxGen {
    type Item = BoundingBox;

    fn next(&mut self) -> Option<Self::Item> {
        self.x += self.gen.sample(self.dist_pos);
        self.y += self.gen.sample(self.dist_pos);

        self.width += self.gen.sample(self.dist_box);
        self.height += self.gen.sample(self.dist_box);

        if self.width < 1.0 {
            self.width = 1.0;
        }
        if self.height < 1.0 {
            self.height = 1.0;
        }

        let x1 = self.x.round() as i32;
        let y1 = self.y.round() as i32;
        Some(BoundingBox::new(
            x1,
            y1,
            x1 + (self.width.round() as i32).max(1),
            y1 + (self.height.round() as i32).max(1),
        ))
    }
}

/// Generator of detections of a single object with jittering box and confidence
///
pub struct DetectionGen {
    boxes: BoxGen,
    class_name: String,
    gen: ThreadRng,
    dist_conf: Uniform<f32>,
}

impl DetectionGen {
    pub fn new(boxes: BoxGen, class_name: &str, min_confidence: f32) -> Self {
        Self {
            boxes,
            class_name: class_name.to_string(),
            gen: rand::thread_rng(),
            dist_conf: Uniform::new_inclusive(min_confidence, 1.0),
        }
    }
}

impl Iterator for DetectionGen {
    type Item = Detection;

    fn next(&mut self) -> Option<Self::Item> {
        let bbox = self.boxes.next()?;
        Some(Detection::new(
            bbox,
            &self.class_name,
            self.gen.sample(self.dist_conf),
        ))
    }
}
