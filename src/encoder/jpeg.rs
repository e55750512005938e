use crate::assets::JPEG_QUALITY;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Frame has no pixels")]
    EmptyFrame,

    #[error("JPEG encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Lossy still-image encoder for outbound webcam frames.
#[derive(Debug, Clone, Copy)]
pub struct JpegFrameEncoder {
    quality: u8,
}

impl JpegFrameEncoder {
    pub fn new() -> Self {
        Self::with_quality(JPEG_QUALITY)
    }

    /// `quality` is a fraction of the format's maximum, clamped to `(0, 1]`.
    pub fn with_quality(quality: f32) -> Self {
        let q = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
        Self { quality: q.max(1) }
    }

    /// Quality on the JPEG 1..=100 scale.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encodes `frame` at its own dimensions.
    pub fn encode(&self, frame: &RgbImage) -> Result<Bytes, EncodeError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(EncodeError::EmptyFrame);
        }

        let mut out = Vec::with_capacity((width * height / 4) as usize);
        JpegEncoder::new_with_quality(&mut out, self.quality).encode(
            frame.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(Bytes::from(out))
    }
}

impl Default for JpegFrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}
