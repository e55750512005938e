use std::time::Duration;

// capture
pub const CAPTURE_PERIOD: Duration = Duration::from_millis(1000);
/// Fraction of the format's maximum quality.
pub const JPEG_QUALITY: f32 = 0.5;
pub const PATTERN_WIDTH: u32 = 640;
pub const PATTERN_HEIGHT: u32 = 480;

// aggregation
pub const SMOOTHING_FACTOR: f64 = 0.2;
pub const EMOTION_DECAY_STEP: f64 = 0.1;
pub const FRESHNESS_WINDOW: Duration = Duration::from_millis(5000);
pub const HISTORY_CAPACITY: usize = 20;
pub const INSIGHT_CAPACITY: usize = 5;
/// Spacing between the synthetic samples of a prefilled history.
pub const PREFILL_SPACING: Duration = Duration::from_secs(2);

// connections
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000/api/v1/ws";
pub const DEFAULT_JOIN_URL: &str = "http://localhost:3000/join";
pub const DEFAULT_SESSION_ID: &str = "session_123";
pub const STUDENT_PREFIX: &str = "student_";
pub const TEACHER_DASHBOARD_ID: &str = "teacher_dashboard";
pub const INBOUND_CAPACITY: usize = 256;

// diagnostics
pub const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(30);
pub const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(2);
