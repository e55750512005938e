//! Pipeline abstraction layer for ClassPulse
//!
//! This module separates the two sides of a session:
//! - Sender: camera capture, JPEG encoding and transmission at a fixed cadence
//! - Receiver: folding the session event stream into dashboard state
//!
//! # Architecture
//!
//! - Each side runs as one async task implementing `PipelineStage`
//! - Socket I/O lives in a connection driver task, reached through channels
//! - `Clock` injects time so freshness and timestamps are testable
//! - Health monitoring tracks frames and messages on both sides

pub mod clock;
pub mod health;
pub mod receiver;
pub mod sender;
pub mod stage;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use health::{HealthSummary, PipelineHealth};
pub use stage::PipelineStage;
pub use types::TickOutcome;
