//! Pixel buffer passed through the pipeline once per call.

use image::{GrayImage, RgbImage, RgbaImage};

use crate::error::{PerceptionError, Result};

/// One camera/video sample.
///
/// Pixels are interleaved, row-major, `channels` bytes each. The pixel format
/// is opaque to the pipeline and handed as-is to the detection capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a raw buffer. Nothing is checked here; see [`Frame::validate`].
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// A zero-filled frame, handy for synthetic inputs.
    pub fn blank(width: u32, height: u32, channels: u8) -> Self {
        let len = width as usize * height as usize * channels as usize;
        Self::from_raw(width, height, channels, vec![0; len])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Check that the buffer is non-empty and consistent with its dimensions.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PerceptionError::invalid_frame(format!(
                "empty frame {}x{}",
                self.width, self.height
            )));
        }
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(PerceptionError::invalid_frame(format!(
                "unsupported channel count {}",
                self.channels
            )));
        }
        let expected = self.width as usize * self.height as usize * self.channels as usize;
        if self.data.len() != expected {
            return Err(PerceptionError::invalid_frame(format!(
                "buffer holds {} bytes, {}x{}x{} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.channels,
                expected
            )));
        }
        Ok(())
    }
}

impl From<RgbImage> for Frame {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_raw(width, height, 3, img.into_raw())
    }
}

impl From<RgbaImage> for Frame {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_raw(width, height, 4, img.into_raw())
    }
}

impl From<GrayImage> for Frame {
    fn from(img: GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_raw(width, height, 1, img.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame_is_valid() {
        assert!(Frame::blank(640, 480, 3).validate().is_ok());
    }

    #[test]
    fn test_empty_frame_rejected() {
        let err = Frame::from_raw(0, 480, 3, vec![]).validate().unwrap_err();
        assert!(matches!(err, PerceptionError::InvalidFrame(_)));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = Frame::from_raw(4, 4, 3, vec![0; 47]).validate().unwrap_err();
        assert!(matches!(err, PerceptionError::InvalidFrame(_)));
    }

    #[test]
    fn test_bad_channels_rejected() {
        let err = Frame::from_raw(2, 2, 2, vec![0; 8]).validate().unwrap_err();
        assert!(matches!(err, PerceptionError::InvalidFrame(_)));
    }

    #[test]
    fn test_from_rgb_image() {
        let frame = Frame::from(RgbImage::new(8, 6));
        assert_eq!((frame.width(), frame.height(), frame.channels()), (8, 6, 3));
        assert_eq!(frame.data().len(), 8 * 6 * 3);
    }
}
