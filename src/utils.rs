/// Bounding boxes
pub mod bbox;

/// Wall-clock helpers
pub mod time;
