//! Pipeline configuration, fixed at construction.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::BackendPreference;
use crate::error::{PerceptionError, Result};
use crate::tracker::TrackerConfig;

/// COCO class index of "person".
pub const PERSON_CLASS: u32 = 0;

/// Which semantic classes the detector output is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassFilter {
    Any,
    Only(BTreeSet<u32>),
}

impl ClassFilter {
    pub fn single(class_id: u32) -> Self {
        ClassFilter::Only(BTreeSet::from([class_id]))
    }

    pub fn contains(&self, class_id: u32) -> bool {
        match self {
            ClassFilter::Any => true,
            ClassFilter::Only(classes) => classes.contains(&class_id),
        }
    }
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self::single(PERSON_CLASS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path or identifier of the detector model. Opaque to the pipeline.
    pub model_reference: String,
    /// In (0, 1].
    pub confidence_threshold: f32,
    pub target_classes: ClassFilter,
    pub backend_preference: BackendPreference,
    pub tracker: TrackerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_reference: "yolov8n".to_string(),
            confidence_threshold: 0.5,
            target_classes: ClassFilter::default(),
            backend_preference: BackendPreference::Auto,
            tracker: TrackerConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        let conf = self.confidence_threshold;
        if !(conf > 0.0 && conf <= 1.0) {
            return Err(PerceptionError::config(format!(
                "confidence_threshold must be in (0, 1], got {conf}"
            )));
        }
        if let ClassFilter::Only(classes) = &self.target_classes {
            if classes.is_empty() {
                return Err(PerceptionError::config(
                    "target_classes is empty, nothing could ever be detected",
                ));
            }
        }
        let tracker = &self.tracker;
        if tracker.frame_rate <= 0.0 {
            return Err(PerceptionError::config("tracker.frame_rate must be positive"));
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&tracker.track_thresh) || !unit.contains(&tracker.match_thresh) {
            return Err(PerceptionError::config("tracker thresholds must be within [0, 1]"));
        }
        Ok(())
    }
}
