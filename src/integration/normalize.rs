//! Pixel geometry to resolution-independent observations.
//!
//! All rounding is half away from zero (`f64::round`), i.e. half up for the
//! non-negative coordinates of in-frame boxes. Relative values are rounded to
//! three decimals. Nothing is clamped: an out-of-frame center comes out
//! negative or above 1 rather than silently corrected.

use serde::{Deserialize, Serialize};

use super::adapter::IdentifiedBox;

/// Decimal places kept in relative values, as a scale factor.
const REL_SCALE: f64 = 1000.0;

/// One tracked object in one frame, as seen by downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub id: u64,
    pub class_id: u32,
    pub confidence: f32,
    /// Center in integer pixels.
    pub abs_center: (i32, i32),
    /// Center as a fraction of frame width and height.
    pub rel_center: (f64, f64),
    /// Size as a fraction of frame width and height.
    pub rel_size: (f64, f64),
}

/// `value / extent` rounded to three decimals.
///
/// Scaling before dividing keeps exact halves exact (1 / 2000 gives 0.001).
#[inline]
fn rel(value: f32, extent: u32) -> f64 {
    (value as f64 * REL_SCALE / extent as f64).round() / REL_SCALE
}

#[inline]
fn px(value: f32) -> i32 {
    (value as f64).round() as i32
}

/// Normalize identity-bearing boxes against a `width` x `height` frame.
///
/// Both dimensions must be non-zero; frames are validated before they reach
/// this point. Output order and length match `boxes`.
pub fn normalize(boxes: &[IdentifiedBox], width: u32, height: u32) -> Vec<TrackedObject> {
    boxes
        .iter()
        .map(|b| TrackedObject {
            id: b.id,
            class_id: b.class_id,
            confidence: b.confidence,
            abs_center: (px(b.bbox.cx), px(b.bbox.cy)),
            rel_center: (rel(b.bbox.cx, width), rel(b.bbox.cy, height)),
            rel_size: (rel(b.bbox.w, width), rel(b.bbox.h, height)),
        })
        .collect()
}
