//! Real-time perception: turns camera frames into a stable stream of tracked
//! objects with resolution-independent geometry and per-frame latency.
//!
//! ```ignore
//! use perception_track::{DetectAndTrack, Frame, PerceptionPipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let capability = DetectAndTrack::new(my_detector, config.tracker.clone());
//! let mut pipeline = PerceptionPipeline::new(capability, config)?;
//!
//! let (annotated, observations, latency_ms) = pipeline.process(&frame)?.into_parts();
//! for obj in &observations {
//!     println!("{} at {:?}", obj.id, obj.rel_center);
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod frame;
pub mod integration;
pub mod tracker;

pub use backend::{BackendId, BackendPreference, Capabilities, select_backend};
pub use config::{ClassFilter, PipelineConfig};
pub use error::{PerceptionError, Result};
pub use frame::Frame;
pub use integration::{
    DetectAndTrack, DetectionBuilder, DetectionSource, FrameOutput, IdentifiedBox, InferParams,
    PerceptionPipeline, RawBox, RawResult, SharedPipeline, TrackedObject, TrackingAdapter,
    TrackingCapability, normalize,
};
pub use tracker::{ByteTracker, Detection, Identity, Rect, TrackerConfig};
