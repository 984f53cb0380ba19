//! A single tracked object.

use crate::tracker::kalman_filter::{KalmanFilter, Measurement, StateCovariance, StateVector};
use crate::tracker::rect::Rect;
use crate::tracker::track_phase::TrackPhase;

/// Identity attached to one detection in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Identity {
    Assigned(u64),
    /// The tracker could not bind this detection to a confirmed track.
    #[default]
    None,
}

impl Identity {
    pub fn id(self) -> Option<u64> {
        match self {
            Identity::Assigned(id) => Some(id),
            Identity::None => None,
        }
    }

    pub fn is_assigned(self) -> bool {
        matches!(self, Identity::Assigned(_))
    }
}

impl From<Option<u64>> for Identity {
    fn from(id: Option<u64>) -> Self {
        id.map_or(Identity::None, Identity::Assigned)
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    /// Identifier issued by the owning tracker; 0 until activated.
    pub track_id: u64,
    pub phase: TrackPhase,
    /// Confirmed tracks are the only ones reported with an identity.
    pub is_activated: bool,
    pub score: f32,
    pub class_id: u32,
    /// Last frame this track was matched in.
    pub frame_id: u32,
    pub start_frame: u32,
    pub tracklet_len: u32,
    pub mean: Option<StateVector>,
    pub covariance: Option<StateCovariance>,
    /// Box of the detection this track was last built from.
    pub detection_box: Rect,
    /// Index of the input detection matched in the current frame.
    pub det_index: Option<usize>,
}

fn measurement(rect: &Rect) -> Measurement {
    let [cx, cy, a, h] = rect.to_xyah();
    Measurement::new(cx as f64, cy as f64, a as f64, h as f64)
}

impl Track {
    /// Candidate track for the `det_index`-th detection of the current frame.
    pub fn new(bbox: Rect, score: f32, class_id: u32, det_index: usize) -> Self {
        Self {
            track_id: 0,
            phase: TrackPhase::New,
            is_activated: false,
            score,
            class_id,
            frame_id: 0,
            start_frame: 0,
            tracklet_len: 0,
            mean: None,
            covariance: None,
            detection_box: bbox,
            det_index: Some(det_index),
        }
    }

    /// Current box estimate: filtered when available, raw detection otherwise.
    pub fn rect(&self) -> Rect {
        match &self.mean {
            Some(mean) => {
                Rect::from_xyah(mean[0] as f32, mean[1] as f32, mean[2] as f32, mean[3] as f32)
            }
            None => self.detection_box,
        }
    }

    pub fn end_frame(&self) -> u32 {
        self.frame_id
    }

    /// Start tracking under a freshly issued id.
    pub fn activate(&mut self, kalman_filter: &KalmanFilter, frame_id: u32, track_id: u64) {
        self.track_id = track_id;

        let (mean, covariance) = kalman_filter.initiate(measurement(&self.detection_box));
        self.mean = Some(mean);
        self.covariance = Some(covariance);
        self.tracklet_len = 0;
        self.phase = TrackPhase::Tracked;

        // Tracks born on the very first frame are trusted immediately.
        if frame_id == 1 {
            self.is_activated = true;
        }

        self.frame_id = frame_id;
        self.start_frame = frame_id;
    }

    /// Bring a lost track back, keeping its id.
    pub fn re_activate(&mut self, det: &Track, kalman_filter: &KalmanFilter, frame_id: u32) {
        self.correct(det, kalman_filter);
        self.tracklet_len = 0;
        self.phase = TrackPhase::Tracked;
        self.is_activated = true;
        self.frame_id = frame_id;
    }

    pub fn update(&mut self, det: &Track, kalman_filter: &KalmanFilter, frame_id: u32) {
        self.correct(det, kalman_filter);
        self.frame_id = frame_id;
        self.tracklet_len += 1;
        self.phase = TrackPhase::Tracked;
        self.is_activated = true;
    }

    fn correct(&mut self, det: &Track, kalman_filter: &KalmanFilter) {
        if let (Some(mean), Some(cov)) = (&self.mean, &self.covariance) {
            let (new_mean, new_cov) =
                kalman_filter.update(mean, cov, measurement(&det.detection_box));
            self.mean = Some(new_mean);
            self.covariance = Some(new_cov);
        }
        self.detection_box = det.detection_box;
        self.score = det.score;
        self.class_id = det.class_id;
        self.det_index = det.det_index;
    }

    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        if let (Some(mean), Some(cov)) = (&self.mean, &self.covariance) {
            let mut mean_to_predict = *mean;
            if self.phase != TrackPhase::Tracked {
                mean_to_predict[7] = 0.0;
            }
            let (new_mean, new_cov) = kalman_filter.predict(&mean_to_predict, cov);
            self.mean = Some(new_mean);
            self.covariance = Some(new_cov);
        }
    }

    pub fn mark_lost(&mut self) {
        self.phase = TrackPhase::Lost;
    }

    pub fn mark_removed(&mut self) {
        self.phase = TrackPhase::Removed;
    }

    pub fn multi_predict(tracks: &mut [Track], kalman_filter: &KalmanFilter) {
        for track in tracks.iter_mut() {
            track.predict(kalman_filter);
        }
    }
}
