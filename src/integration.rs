//! Integration of detection backends with tracking, normalization and the
//! per-frame pipeline.
//!
//! - [`DetectionSource`]: any object detector.
//! - [`TrackingCapability`]: the detector-and-tracker black box, with
//!   [`DetectAndTrack`] as the bundled implementation.
//! - [`TrackingAdapter`]: owns the capability and its tracking state.
//! - [`normalize`]: pixel boxes to resolution-independent [`TrackedObject`]s.
//! - [`PerceptionPipeline`]: the per-frame entry point.

mod adapter;
mod builder;
mod bytetrack;
mod detector;
mod normalize;
mod pipeline;
mod render;

pub use adapter::{
    IdentifiedBox, InferParams, RawBox, RawResult, TrackingAdapter, TrackingCapability,
};
pub use builder::DetectionBuilder;
pub use bytetrack::DetectAndTrack;
pub use detector::DetectionSource;
pub use normalize::{TrackedObject, normalize};
pub use pipeline::{FrameOutput, PerceptionPipeline, SharedPipeline};
pub use render::annotate;

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnDetector, BurnDetectorError, BurnModel, RawDetection};
