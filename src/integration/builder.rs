//! Builder for creating Detection objects from various box formats.

use crate::tracker::{Detection, Rect};

/// Builder for [`Detection`]s from TLBR, XYWH or TLWH boxes.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    bbox: Rect,
    score: f32,
    class_id: u32,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = Rect::from_tlbr(x1, y1, x2, y2);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::from_xywh(cx, cy, w, h);
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::new(l, t, w, h);
        self
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn build(self) -> Detection {
        Detection::from_rect(self.bbox, self.score).with_class(self.class_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new()
            .xywh(320.0, 240.0, 64.0, 128.0)
            .score(0.95)
            .class(2)
            .build();

        assert_eq!(det.score, 0.95);
        assert_eq!(det.class_id, 2);
        assert_eq!(det.bbox.to_tlbr(), [288.0, 176.0, 352.0, 304.0]);
    }

    #[test]
    fn test_tlwh_and_tlbr_agree() {
        let a = DetectionBuilder::new().tlwh(10.0, 20.0, 30.0, 40.0).build();
        let b = DetectionBuilder::new().tlbr(10.0, 20.0, 40.0, 60.0).build();
        assert_eq!(a.bbox, b.bbox);
    }
}
