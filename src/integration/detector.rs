//! Trait for object detection inference backends.

use crate::backend::Capabilities;
use crate::frame::Frame;
use crate::tracker::Detection;

/// Trait for object detection inference backends.
///
/// Implement this trait to plug any detection model into
/// [`DetectAndTrack`](super::DetectAndTrack).
///
/// # Example
///
/// ```ignore
/// use perception_track::{Detection, DetectionSource, Frame};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run inference on one frame.
    ///
    /// Boxes are in the frame's pixel coordinates. Filtering by confidence
    /// and class is done by the caller, so implementations may return
    /// everything the model produced.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error>;

    /// Accelerators the model can run on. CPU only unless overridden.
    fn capabilities(&self) -> Capabilities {
        Capabilities::cpu_only()
    }
}

impl<D: DetectionSource + ?Sized> DetectionSource for Box<D> {
    type Error = D::Error;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        (**self).detect(frame)
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }
}
