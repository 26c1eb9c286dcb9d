use crate::detection::domain::object_kind::ObjectKind;

/// Axis-aligned box in normalized frame coordinates (0..1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Converts to pixel coordinates for a frame of the given size.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> (i32, i32, i32, i32) {
        let fw = frame_width as f32;
        let fh = frame_height as f32;
        (
            (self.left * fw).round() as i32,
            (self.top * fh).round() as i32,
            (self.width * fw).round() as i32,
            (self.height * fh).round() as i32,
        )
    }
}

/// One detected object. Immutable once produced by evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub kind: ObjectKind,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(kind: ObjectKind, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            kind,
            bbox,
            confidence,
        }
    }
}
