//! Camera capture module
//!
//! Provides camera sources behind a common async acquisition trait: a
//! synthetic test pattern and a still image loaded from disk.

mod error;
mod pattern;
mod still;
mod traits;

pub use error::DeviceError;
pub use pattern::{render_pattern, PatternCamera};
pub use still::StillImageCamera;
pub use traits::{CameraHandle, CameraSource, FrameSource};
