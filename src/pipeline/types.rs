//! Core types for the pipeline system

use std::fmt;

/// What one capture tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// An encoded frame was handed to the connection
    Sent { bytes: usize, width: u32, height: u32 },

    /// Skipped: the connection is not open
    NotOpen,

    /// Skipped: no camera, or the camera is not ready
    CameraNotReady,

    /// The frame could not be encoded
    EncodeFailed,
}

impl TickOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, TickOutcome::Sent { .. })
    }
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::Sent { bytes, width, height } => write!(f, "sent {}x{} frame ({} bytes)", width, height, bytes),
            TickOutcome::NotOpen => write!(f, "skipped, connection not open"),
            TickOutcome::CameraNotReady => write!(f, "skipped, camera not ready"),
            TickOutcome::EncodeFailed => write!(f, "encode failed"),
        }
    }
}
