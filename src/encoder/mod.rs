//! Frame encoding for the capture agent.

pub mod jpeg;

pub use jpeg::{EncodeError, JpegFrameEncoder};
