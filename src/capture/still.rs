//! Camera backed by a single image file, served as every frame.

use crate::capture::{CameraSource, DeviceError, FrameSource};
use async_trait::async_trait;
use image::{ImageError, RgbImage};
use log::debug;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CameraSource for StillImageCamera {
    async fn acquire(&mut self) -> Result<Box<dyn FrameSource>, DeviceError> {
        let path = self.path.clone();
        let what = path.display().to_string();

        let decoded = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|e| DeviceError::Unusable(format!("{}: {}", what, e)))?;

        let image = match decoded {
            Ok(image) => image.to_rgb8(),
            Err(ImageError::IoError(e)) => return Err(DeviceError::from_io(&what, &e)),
            Err(e) => return Err(DeviceError::Unusable(format!("{}: {}", what, e))),
        };
        debug!("Loaded {} ({}x{})", what, image.width(), image.height());

        Ok(Box::new(StillStream {
            image,
            released: false,
        }))
    }

    fn describe(&self) -> String {
        format!("still image {}", self.path.display())
    }
}

struct StillStream {
    image: RgbImage,
    released: bool,
}

impl FrameSource for StillStream {
    fn is_ready(&self) -> bool {
        !self.released
    }

    fn resolution(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn grab(&mut self) -> Option<RgbImage> {
        (!self.released).then(|| self.image.clone())
    }

    fn release(&mut self) {
        self.released = true;
    }
}
