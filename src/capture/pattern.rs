//! Synthetic camera producing an animated test pattern.

use crate::capture::{CameraSource, DeviceError, FrameSource};
use async_trait::async_trait;
use image::{Rgb, RgbImage};

/// Simple LCG for per-frame noise, reproducible across platforms.
#[inline]
fn prng(seed: u64) -> u64 {
    seed.wrapping_mul(1103515245).wrapping_add(12345) & 0x7fffffff
}

/// Renders one pattern frame: a diagonal colour gradient that drifts with
/// `frame_num`, a bright spot orbiting the centre and light noise.
pub fn render_pattern(width: u32, height: u32, frame_num: u64) -> RgbImage {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;
    let cx = w / 2.0;
    let cy = h / 2.0;

    let orbit = w.min(h) / 4.0;
    let angle = (frame_num as f64 * 0.3) % (2.0 * std::f64::consts::PI);
    let spot_x = cx + orbit * angle.cos();
    let spot_y = cy + orbit * angle.sin();
    let spot_sigma = (w.min(h) / 12.0).max(1.0);

    let shift = (frame_num * 8) as f64;
    let frame_seed = frame_num.wrapping_mul(2654435761);

    RgbImage::from_fn(width, height, |x, y| {
        let fx = x as f64;
        let fy = y as f64;

        let dx = fx - spot_x;
        let dy = fy - spot_y;
        let spot = (-(dx * dx + dy * dy) / (2.0 * spot_sigma * spot_sigma)).exp() * 255.0;

        let noise = (prng(frame_seed ^ ((y as u64) << 32 | x as u64)) & 0x0f) as f64;

        let r = ((fx + shift) / w * 255.0) % 256.0;
        let g = ((fy + shift) / h * 255.0) % 256.0;
        let b = 128.0 + noise;

        Rgb([
            (r + spot).min(255.0) as u8,
            (g + spot).min(255.0) as u8,
            (b + spot).min(255.0) as u8,
        ])
    })
}

/// Camera with no hardware behind it.
#[derive(Debug, Clone)]
pub struct PatternCamera {
    width: u32,
    height: u32,
}

impl PatternCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[async_trait]
impl CameraSource for PatternCamera {
    async fn acquire(&mut self) -> Result<Box<dyn FrameSource>, DeviceError> {
        if self.width == 0 || self.height == 0 {
            return Err(DeviceError::Unusable(format!(
                "pattern resolution {}x{} has no area",
                self.width, self.height
            )));
        }
        Ok(Box::new(PatternStream {
            width: self.width,
            height: self.height,
            frame_num: 0,
            released: false,
        }))
    }

    fn describe(&self) -> String {
        format!("test pattern {}x{}", self.width, self.height)
    }
}

struct PatternStream {
    width: u32,
    height: u32,
    frame_num: u64,
    released: bool,
}

impl FrameSource for PatternStream {
    fn is_ready(&self) -> bool {
        !self.released
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab(&mut self) -> Option<RgbImage> {
        if self.released {
            return None;
        }
        let frame = render_pattern(self.width, self.height, self.frame_num);
        self.frame_num += 1;
        Some(frame)
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pattern_stream_lifecycle() {
        let mut camera = PatternCamera::new(64, 48);
        let mut stream = camera.acquire().await.unwrap();
        assert!(stream.is_ready());
        assert_eq!(stream.resolution(), (64, 48));

        let first = stream.grab().unwrap();
        let second = stream.grab().unwrap();
        assert_eq!(first.dimensions(), (64, 48));
        assert_ne!(first, second);

        stream.release();
        stream.release();
        assert!(!stream.is_ready());
        assert!(stream.grab().is_none());
    }

    #[tokio::test]
    async fn test_zero_area_pattern_is_unusable() {
        let mut camera = PatternCamera::new(0, 480);
        assert!(matches!(camera.acquire().await, Err(DeviceError::Unusable(_))));
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render_pattern(16, 16, 3), render_pattern(16, 16, 3));
    }
}
