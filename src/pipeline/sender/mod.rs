//! Sender pipeline components
//!
//! This module contains the producer-side pipeline:
//! - CaptureStage: grab, encode and send one frame per tick
//! - FrameCaptureAgent: owns the camera and the capture timer
//!
//! The sender pipeline flow:
//! ```text
//! Camera → Capture → JPEG → LatestSlot → Network
//! ```

pub mod capture_stage;
pub mod coordinator;

pub use capture_stage::CaptureStage;
pub use coordinator::FrameCaptureAgent;
