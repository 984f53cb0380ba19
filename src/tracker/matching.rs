//! Detection input and association helpers for the tracker.

use ndarray::Array2;
use tracing::warn;

use crate::tracker::rect::Rect;

/// One detector output handed to the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: Rect,
    pub score: f32,
    /// Semantic class reported by the detector.
    pub class_id: u32,
}

impl Detection {
    /// Build from TLBR corners.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self::from_rect(Rect::from_tlbr(x1, y1, x2, y2), score)
    }

    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self {
            bbox,
            score,
            class_id: 0,
        }
    }

    pub fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }
}

/// `1 - IoU` cost between every track box and every detection box.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    Array2::from_shape_fn((track_boxes.len(), det_boxes.len()), |(i, j)| {
        1.0 - track_boxes[i].iou(&det_boxes[j])
    })
}

/// Scale IoU similarity by detection confidence.
pub fn fuse_score(cost_matrix: &mut Array2<f32>, scores: &[f32]) {
    for ((_, j), cost) in cost_matrix.indexed_iter_mut() {
        let fused_sim = (1.0 - *cost) * scores[j];
        *cost = 1.0 - fused_sim;
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Minimum-cost assignment, discarding pairs whose cost exceeds `thresh`.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    // lapjv wants a square matrix; pad with a prohibitive cost.
    let size = num_rows.max(num_cols);
    let padded = Array2::<f64>::from_shape_fn((size, size), |(i, j)| {
        if i < num_rows && j < num_cols {
            cost_matrix[[i, j]] as f64
        } else {
            1e6
        }
    });

    let mut result = AssignmentResult::default();
    let mut det_unmatched = vec![true; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row, &col) in row_to_col.iter().enumerate().take(num_rows) {
                if col < num_cols && cost_matrix[[row, col]] <= thresh {
                    result.matches.push((row, col));
                    det_unmatched[col] = false;
                } else {
                    result.unmatched_tracks.push(row);
                }
            }
        }
        Err(e) => {
            warn!(error = ?e, "linear assignment failed, leaving everything unmatched");
            result.unmatched_tracks = (0..num_rows).collect();
        }
    }

    result.unmatched_detections = det_unmatched
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| u.then_some(i))
        .collect();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_picks_overlapping_pairs() {
        let tracks = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(100.0, 100.0, 10.0, 10.0)];
        let dets = [Rect::new(101.0, 101.0, 10.0, 10.0), Rect::new(1.0, 1.0, 10.0, 10.0)];
        let dists = iou_distance(&tracks, &dets);
        let res = linear_assignment(&dists, 0.8);

        let mut matches = res.matches.clone();
        matches.sort();
        assert_eq!(matches, vec![(0, 1), (1, 0)]);
        assert!(res.unmatched_tracks.is_empty());
        assert!(res.unmatched_detections.is_empty());
    }

    #[test]
    fn test_assignment_respects_threshold() {
        let tracks = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let dets = [Rect::new(50.0, 50.0, 10.0, 10.0)];
        let res = linear_assignment(&iou_distance(&tracks, &dets), 0.8);
        assert!(res.matches.is_empty());
        assert_eq!(res.unmatched_tracks, vec![0]);
        assert_eq!(res.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_assignment_empty_side() {
        let res = linear_assignment(&Array2::zeros((0, 3)), 0.5);
        assert_eq!(res.unmatched_detections, vec![0, 1, 2]);
        assert!(res.unmatched_tracks.is_empty());
    }

    #[test]
    fn test_fuse_score() {
        let mut cost = Array2::from_elem((1, 1), 0.0f32);
        fuse_score(&mut cost, &[0.5]);
        assert!((cost[[0, 0]] - 0.5).abs() < 1e-6);
    }
}
