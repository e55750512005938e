//! Traits for camera capture functionality

use crate::capture::DeviceError;
use async_trait::async_trait;
use image::RgbImage;
use log::info;

/// A camera that can be opened asynchronously.
///
/// Acquisition may take arbitrarily long or never complete, so callers run it
/// as a cancellable task.
#[async_trait]
pub trait CameraSource: Send + Sync {
    async fn acquire(&mut self) -> Result<Box<dyn FrameSource>, DeviceError>;

    /// Human readable device description for logs.
    fn describe(&self) -> String;
}

/// An opened camera stream.
pub trait FrameSource: Send {
    /// Whether a frame can be grabbed right now.
    fn is_ready(&self) -> bool;

    /// Native resolution in (width, height)
    fn resolution(&self) -> (u32, u32);

    /// The current frame at native resolution, or `None` if not ready.
    fn grab(&mut self) -> Option<RgbImage>;

    /// Stops every track. Idempotent.
    fn release(&mut self);
}

/// Owning handle to an opened camera that releases it when dropped.
pub struct CameraHandle {
    source: Box<dyn FrameSource>,
}

impl CameraHandle {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self { source }
    }

    pub fn source_mut(&mut self) -> &mut dyn FrameSource {
        self.source.as_mut()
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.source.resolution()
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        if self.source.is_ready() {
            info!("Releasing camera");
        }
        self.source.release();
    }
}
