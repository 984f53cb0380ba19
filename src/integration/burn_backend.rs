//! Burn inference backend for object detection.
//!
//! `BurnDetector` implements [`DetectionSource`] for detection models built
//! with the Burn framework, so they can drive a
//! [`DetectAndTrack`](super::DetectAndTrack) capability.
//!
//! # Example
//!
//! ```ignore
//! use perception_track::integration::{BurnDetector, BurnModel, RawDetection};
//! use burn::backend::NdArray;
//!
//! struct MyYoloModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MyYoloModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<RawDetection> {
//!         // Run inference
//!     }
//! }
//!
//! let model = MyYoloModel::load(&config.model_reference);
//! let detector = BurnDetector::for_backend(model, BackendId::Cpu)?;
//! ```

use burn::backend::NdArray;
use burn::backend::ndarray::NdArrayDevice;
use burn::prelude::*;
use burn::tensor::Tensor;
use thiserror::Error;

use super::{DetectionBuilder, DetectionSource};
use crate::backend::BackendId;
use crate::frame::Frame;
use crate::tracker::Detection;

#[derive(Error, Debug, Clone)]
pub enum BurnDetectorError {
    #[error("invalid input dimensions: expected {expected:?} (c, h, w), got {got:?}")]
    InvalidInputDimensions {
        expected: (u32, u32, u32),
        got: (u32, u32, u32),
    },

    #[error("preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("backend {0} is not supported by this engine")]
    UnsupportedBackend(BackendId),
}

/// Raw detection output from the model before thresholding.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// [x1, y1, x2, y2] or [cx, cy, w, h] depending on the model
    pub bbox: [f32; 4],
    pub score: f32,
    pub class_id: u32,
}

/// Trait for Burn-based detection models.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Forward pass on a [batch, channels, height, width] tensor.
    fn forward(&self, input: Tensor<B, 4>) -> Vec<RawDetection>;

    /// Expected input size (channels, height, width).
    fn input_size(&self) -> (u32, u32, u32) {
        (3, 640, 640)
    }

    /// Whether bbox output is XYWH rather than TLBR.
    fn bbox_is_xywh(&self) -> bool {
        true
    }
}

pub struct BurnDetector<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
}

impl<B: Backend, M: BurnModel<B>> BurnDetector<B, M> {
    pub fn new(model: M, device: B::Device) -> Self {
        Self { model, device }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Turn an interleaved HWC frame into a normalized [1, C, H, W] tensor.
    pub fn preprocess(&self, frame: &Frame) -> Result<Tensor<B, 4>, BurnDetectorError> {
        let (channels, target_h, target_w) = self.model.input_size();
        let got = (frame.channels() as u32, frame.height(), frame.width());

        if got != (channels, target_h, target_w) {
            return Err(BurnDetectorError::InvalidInputDimensions {
                expected: (channels, target_h, target_w),
                got,
            });
        }

        let expected_len = (channels * target_h * target_w) as usize;
        if frame.data().len() != expected_len {
            return Err(BurnDetectorError::PreprocessingError(format!(
                "frame buffer holds {} bytes, expected {}",
                frame.data().len(),
                expected_len
            )));
        }

        let data: Vec<f32> = frame.data().iter().map(|&x| x as f32 / 255.0).collect();

        // HWC -> CHW
        let tensor = Tensor::<B, 1>::from_floats(data.as_slice(), &self.device)
            .reshape([1, target_h as usize, target_w as usize, channels as usize])
            .permute([0, 3, 1, 2]);

        Ok(tensor)
    }

    fn postprocess(&self, raw_detections: Vec<RawDetection>) -> Vec<Detection> {
        raw_detections
            .into_iter()
            .map(|d| {
                let [a, b, c, e] = d.bbox;
                let builder = DetectionBuilder::new().score(d.score).class(d.class_id);
                if self.model.bbox_is_xywh() {
                    builder.xywh(a, b, c, e).build()
                } else {
                    builder.tlbr(a, b, c, e).build()
                }
            })
            .collect()
    }
}

impl<M: BurnModel<NdArray>> BurnDetector<NdArray, M> {
    /// Detector on the device the selected backend names.
    ///
    /// The ndarray engine runs on the CPU only.
    pub fn for_backend(model: M, backend: BackendId) -> Result<Self, BurnDetectorError> {
        match backend {
            BackendId::Cpu => Ok(Self::new(model, NdArrayDevice::Cpu)),
            other => Err(BurnDetectorError::UnsupportedBackend(other)),
        }
    }
}

impl<B: Backend, M: BurnModel<B>> DetectionSource for BurnDetector<B, M> {
    type Error = BurnDetectorError;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        let tensor = self.preprocess(frame)?;
        let raw_detections = self.model.forward(tensor);
        Ok(self.postprocess(raw_detections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl BurnModel<NdArray> for Silent {
        fn forward(&self, _input: Tensor<NdArray, 4>) -> Vec<RawDetection> {
            Vec::new()
        }

        fn input_size(&self) -> (u32, u32, u32) {
            (3, 4, 4)
        }
    }

    #[test]
    fn test_device_follows_backend() {
        let detector = BurnDetector::for_backend(Silent, BackendId::Cpu).unwrap();
        assert_eq!(*detector.device(), NdArrayDevice::Cpu);

        let err = BurnDetector::for_backend(Silent, BackendId::Cuda).err().unwrap();
        assert!(matches!(err, BurnDetectorError::UnsupportedBackend(BackendId::Cuda)));
    }

    #[test]
    fn test_detect_checks_input_size() {
        let mut detector = BurnDetector::for_backend(Silent, BackendId::Cpu).unwrap();
        assert!(detector.detect(&Frame::blank(4, 4, 3)).unwrap().is_empty());
        assert!(detector.detect(&Frame::blank(8, 4, 3)).is_err());
    }
}
