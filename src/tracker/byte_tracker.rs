//! ByteTrack association over consecutive frames.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::rect::{Rect, iou_batch};
use crate::tracker::track::{Identity, Track};
use crate::tracker::track_phase::TrackPhase;

/// Detections scoring at or below this never take part in association.
const MIN_LOW_SCORE: f32 = 0.1;
/// Tracked/lost boxes overlapping more than this are considered duplicates.
const DUPLICATE_IOU: f32 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Detections at or above this score go to the first association.
    pub track_thresh: f32,
    /// Maximum fused cost accepted in the first association.
    pub match_thresh: f32,
    /// Frames a lost track is kept, expressed at 30 fps.
    pub track_buffer: u32,
    pub frame_rate: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            track_thresh: 0.5,
            match_thresh: 0.8,
            track_buffer: 30,
            frame_rate: 30.0,
        }
    }
}

/// Multi-object tracker state.
///
/// Every instance issues its own ids: they start at 1 and strictly increase,
/// and no two instances ever share a counter.
#[derive(Debug, Clone)]
pub struct ByteTracker {
    tracked: Vec<Track>,
    lost: Vec<Track>,
    frame_id: u32,
    next_id: u64,
    config: TrackerConfig,
    max_time_lost: u32,
    kalman_filter: KalmanFilter,
}

impl Default for ByteTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl ByteTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let max_time_lost = (config.frame_rate / 30.0 * config.track_buffer as f32) as u32;
        Self {
            tracked: Vec::new(),
            lost: Vec::new(),
            frame_id: 0,
            next_id: 1,
            config,
            max_time_lost,
            kalman_filter: KalmanFilter::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of frames seen so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_id
    }

    /// Drop every track and start counting frames again.
    ///
    /// The id counter survives, so identities issued afterwards never repeat
    /// one issued before.
    pub fn reset(&mut self) {
        self.tracked.clear();
        self.lost.clear();
        self.frame_id = 0;
    }

    fn issue_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Identity for each input detection, in input order.
    ///
    /// A detection gets `Identity::Assigned` only when it ends the frame bound
    /// to a confirmed track.
    pub fn assign(&mut self, detections: Vec<Detection>) -> Vec<Identity> {
        let mut identities = vec![Identity::None; detections.len()];
        for track in self.update(detections) {
            if let Some(idx) = track.det_index {
                identities[idx] = Identity::Assigned(track.track_id);
            }
        }
        identities
    }

    /// Advance one frame and return the confirmed, currently tracked tracks.
    pub fn update(&mut self, detections: Vec<Detection>) -> Vec<Track> {
        self.frame_id += 1;

        for track in self.tracked.iter_mut().chain(self.lost.iter_mut()) {
            track.det_index = None;
        }

        let mut activated = Vec::new();
        let mut refound = Vec::new();
        let mut lost = Vec::new();
        let mut removed = 0usize;

        // Split detections by score, remembering their input position.
        let mut detections_high = Vec::new();
        let mut detections_low = Vec::new();
        for (idx, det) in detections.into_iter().enumerate() {
            let candidate = Track::new(det.bbox, det.score, det.class_id, idx);
            if det.score >= self.config.track_thresh {
                detections_high.push(candidate);
            } else if det.score > MIN_LOW_SCORE {
                detections_low.push(candidate);
            }
        }

        let (mut confirmed, mut unconfirmed): (Vec<Track>, Vec<Track>) =
            self.tracked.drain(..).partition(|t| t.is_activated);

        // Lost tracks keep moving too, so they can be re-found where they went.
        Track::multi_predict(&mut confirmed, &self.kalman_filter);
        Track::multi_predict(&mut self.lost, &self.kalman_filter);
        let pool = joint_tracks(confirmed, &self.lost);

        // First association: high score detections against every live track.
        let mut dists = matching::iou_distance(&rects(&pool), &rects(&detections_high));
        matching::fuse_score(&mut dists, &scores(&detections_high));
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::linear_assignment(&dists, self.config.match_thresh);

        for (itracked, idet) in matches {
            let mut track = pool[itracked].clone();
            let det = &detections_high[idet];
            if track.phase == TrackPhase::Tracked {
                track.update(det, &self.kalman_filter, self.frame_id);
                activated.push(track);
            } else {
                track.re_activate(det, &self.kalman_filter, self.frame_id);
                refound.push(track);
            }
        }

        // Second association: low score detections against tracks still in view.
        let remaining: Vec<Track> = unmatched_tracks
            .iter()
            .filter(|&&idx| pool[idx].phase == TrackPhase::Tracked)
            .map(|&idx| pool[idx].clone())
            .collect();

        let dists_low = matching::iou_distance(&rects(&remaining), &rects(&detections_low));
        let AssignmentResult {
            matches: matches_low,
            unmatched_tracks: unmatched_low,
            ..
        } = matching::linear_assignment(&dists_low, 0.5);

        for (itracked, idet) in matches_low {
            let mut track = remaining[itracked].clone();
            track.update(&detections_low[idet], &self.kalman_filter, self.frame_id);
            activated.push(track);
        }

        for idx in unmatched_low {
            let mut track = remaining[idx].clone();
            track.mark_lost();
            lost.push(track);
        }

        // Unconfirmed tracks (seen once) get one chance at the leftovers.
        let leftovers: Vec<Track> = unmatched_detections
            .into_iter()
            .map(|idx| detections_high[idx].clone())
            .collect();

        let mut dists_unconfirmed =
            matching::iou_distance(&rects(&unconfirmed), &rects(&leftovers));
        matching::fuse_score(&mut dists_unconfirmed, &scores(&leftovers));
        let AssignmentResult {
            matches: matches_unconfirmed,
            unmatched_tracks: stale_unconfirmed,
            unmatched_detections: fresh,
        } = matching::linear_assignment(&dists_unconfirmed, 0.7);

        for (itracked, idet) in matches_unconfirmed {
            unconfirmed[itracked].update(&leftovers[idet], &self.kalman_filter, self.frame_id);
            activated.push(unconfirmed[itracked].clone());
        }
        removed += stale_unconfirmed.len();

        // New tracks from confident, unmatched detections.
        for idx in fresh {
            let mut track = leftovers[idx].clone();
            if track.score < self.config.track_thresh + 0.1 {
                continue;
            }
            let id = self.issue_id();
            track.activate(&self.kalman_filter, self.frame_id, id);
            activated.push(track);
        }

        // Expire tracks lost for too long.
        for track in self.lost.drain(..) {
            if self.frame_id - track.end_frame() > self.max_time_lost {
                removed += 1;
            } else {
                lost.push(track);
            }
        }

        let tracked: Vec<Track> = activated
            .into_iter()
            .chain(refound)
            .filter(|t| t.phase == TrackPhase::Tracked)
            .collect();
        let lost = sub_tracks(lost, &tracked);

        let (tracked, lost) = remove_duplicate_tracks(tracked, lost);
        self.tracked = tracked;
        self.lost = lost;

        trace!(
            frame = self.frame_id,
            tracked = self.tracked.len(),
            lost = self.lost.len(),
            removed,
            "tracker updated"
        );

        self.tracked
            .iter()
            .filter(|t| t.is_activated)
            .cloned()
            .collect()
    }
}

fn rects(tracks: &[Track]) -> Vec<Rect> {
    tracks.iter().map(Track::rect).collect()
}

fn scores(tracks: &[Track]) -> Vec<f32> {
    tracks.iter().map(|t| t.score).collect()
}

/// Union by track id, keeping the first occurrence.
fn joint_tracks(list_a: Vec<Track>, list_b: &[Track]) -> Vec<Track> {
    let mut seen: HashSet<u64> = list_a.iter().map(|t| t.track_id).collect();
    let mut res = list_a;
    for t in list_b {
        if seen.insert(t.track_id) {
            res.push(t.clone());
        }
    }
    res
}

/// Tracks of `list_a` whose id is absent from `list_b`.
fn sub_tracks(list_a: Vec<Track>, list_b: &[Track]) -> Vec<Track> {
    let b_ids: HashSet<u64> = list_b.iter().map(|t| t.track_id).collect();
    list_a
        .into_iter()
        .filter(|t| !b_ids.contains(&t.track_id))
        .collect()
}

/// Drop the younger of any tracked/lost pair that overlaps almost entirely.
fn remove_duplicate_tracks(
    tracks_a: Vec<Track>,
    tracks_b: Vec<Track>,
) -> (Vec<Track>, Vec<Track>) {
    if tracks_a.is_empty() || tracks_b.is_empty() {
        return (tracks_a, tracks_b);
    }

    let ious = iou_batch(&rects(&tracks_a), &rects(&tracks_b));
    let mut dup_a = vec![false; tracks_a.len()];
    let mut dup_b = vec![false; tracks_b.len()];

    for ((i, j), &iou) in ious.indexed_iter() {
        if iou > DUPLICATE_IOU {
            let age_a = tracks_a[i].frame_id - tracks_a[i].start_frame;
            let age_b = tracks_b[j].frame_id - tracks_b[j].start_frame;
            if age_a > age_b {
                dup_b[j] = true;
            } else {
                dup_a[i] = true;
            }
        }
    }

    let keep = |tracks: Vec<Track>, dup: &[bool]| -> Vec<Track> {
        tracks
            .into_iter()
            .zip(dup)
            .filter(|(_, d)| !**d)
            .map(|(t, _)| t)
            .collect()
    };

    (keep(tracks_a, &dup_a), keep(tracks_b, &dup_b))
}
