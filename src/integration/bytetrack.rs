//! Detection plus ByteTrack, packaged as a [`TrackingCapability`].

use tracing::trace;

use crate::backend::Capabilities;
use crate::frame::Frame;
use crate::tracker::{ByteTracker, Detection, TrackerConfig};

use super::DetectionSource;
use super::adapter::{InferParams, RawBox, RawResult, TrackingCapability};

/// Runs any [`DetectionSource`] and assigns identities with [`ByteTracker`].
///
/// This plays the part of the external detector-and-tracker: confidence and
/// class filtering happen here, before the adapter sees anything. It leaves
/// drawing to the pipeline.
pub struct DetectAndTrack<D: DetectionSource> {
    detector: D,
    tracker_config: TrackerConfig,
}

impl<D: DetectionSource> DetectAndTrack<D> {
    pub fn new(detector: D, tracker_config: TrackerConfig) -> Self {
        Self {
            detector,
            tracker_config,
        }
    }

    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, TrackerConfig::default())
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }
}

impl<D: DetectionSource> TrackingCapability for DetectAndTrack<D> {
    type State = ByteTracker;
    type Error = D::Error;

    fn init_state(&self) -> ByteTracker {
        ByteTracker::new(self.tracker_config.clone())
    }

    fn reset_state(&self, tracker: &mut ByteTracker) {
        tracker.reset();
    }

    fn capabilities(&self) -> Capabilities {
        self.detector.capabilities()
    }

    fn infer(
        &mut self,
        frame: &Frame,
        params: &InferParams<'_>,
        tracker: &mut ByteTracker,
    ) -> Result<RawResult, Self::Error> {
        let detections: Vec<Detection> = self
            .detector
            .detect(frame)?
            .into_iter()
            .filter(|d| {
                d.score >= params.confidence_threshold
                    && params.target_classes.contains(d.class_id)
            })
            .collect();

        let boxes: Vec<RawBox> = detections.iter().map(|d| RawBox::from(d.bbox)).collect();
        let class_ids = detections.iter().map(|d| d.class_id).collect();
        let confidences = detections.iter().map(|d| d.score).collect();
        let identities = tracker.assign(detections);

        trace!(
            frame = tracker.frame_count(),
            backend = %params.backend,
            kept = boxes.len(),
            "detections filtered"
        );

        Ok(RawResult {
            boxes,
            class_ids,
            confidences,
            identities,
            annotated: None,
        })
    }
}
