//! Health monitoring and metrics for pipeline

use std::sync::atomic::{AtomicU64, Ordering};

/// Health metrics for a pipeline
///
/// Tracks counters for both sides of the session: frames the capture agent
/// sent or skipped, and messages the dashboard folded or dropped.
/// All fields use atomic operations for thread-safe access.
#[derive(Debug, Default)]
pub struct PipelineHealth {
    /// Frames handed to the connection
    pub frames_sent: AtomicU64,

    /// Ticks that produced nothing because the connection was not open
    pub skipped_not_open: AtomicU64,

    /// Ticks that produced nothing because the camera was not ready
    pub skipped_no_camera: AtomicU64,

    /// Unsent frames replaced by a newer one in the outbound slot
    pub frames_superseded: AtomicU64,

    /// Number of encode failures
    pub encode_failures: AtomicU64,

    /// Total bytes of encoded frames handed to the connection
    pub bytes_sent: AtomicU64,

    /// Inbound messages successfully folded into state
    pub messages_received: AtomicU64,

    /// Inbound messages dropped as malformed
    pub malformed_messages: AtomicU64,
}

impl PipelineHealth {
    /// Create a new health metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame_sent(&self, size: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn record_skip_not_open(&self) {
        self.skipped_not_open.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip_no_camera(&self) {
        self.skipped_no_camera.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_superseded(&self) {
        self.frames_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Frames that were due but never reached the connection
    pub fn frames_dropped(&self) -> u64 {
        self.skipped_not_open.load(Ordering::Relaxed)
            + self.skipped_no_camera.load(Ordering::Relaxed)
            + self.encode_failures.load(Ordering::Relaxed)
    }

    /// Get a summary of health metrics
    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped(),
            frames_superseded: self.frames_superseded.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of health metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSummary {
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub frames_superseded: u64,
    pub bytes_sent: u64,
    pub messages_received: u64,
    pub malformed_messages: u64,
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Health: {} frames sent ({} dropped, {} superseded), {} bytes, {} messages ({} malformed)",
            self.frames_sent,
            self.frames_dropped,
            self.frames_superseded,
            self.bytes_sent,
            self.messages_received,
            self.malformed_messages
        )
    }
}
