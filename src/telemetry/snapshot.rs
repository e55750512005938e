use crate::events::{Emotion, Mood};
use crate::telemetry::feeds::ActiveFeed;
use crate::telemetry::history::EngagementSample;
use crate::telemetry::insights::InsightEvent;
use crate::telemetry::state::TelemetryState;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionWeight {
    pub emotion: Emotion,
    pub weight: f64,
}

/// Everything the instructor view shows, evaluated at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub taken_at: DateTime<Utc>,
    pub active_students: u32,
    pub engagement: f64,
    pub peak_engagement: f64,
    pub dominant_mood: Mood,
    pub total_frames: f64,
    pub history: Vec<EngagementSample>,
    pub emotions: Vec<EmotionWeight>,
    pub active_feeds: Vec<ActiveFeed>,
    pub insights: Vec<InsightEvent>,
}

impl DashboardSnapshot {
    pub fn of(state: &TelemetryState, now: DateTime<Utc>) -> Self {
        Self {
            taken_at: now,
            active_students: state.active_students,
            engagement: state.smoothed_engagement,
            peak_engagement: state.peak_engagement(),
            dominant_mood: state.dominant_mood(),
            total_frames: state.total_frames(),
            history: state.history.iter().cloned().collect(),
            emotions: state
                .emotions
                .entries()
                .map(|(emotion, weight)| EmotionWeight { emotion, weight })
                .collect(),
            active_feeds: state.active_feeds(now),
            insights: state.insights.iter().cloned().collect(),
        }
    }
}

impl std::fmt::Display for DashboardSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} students, engagement {}% (peak {:.0}%), mood {}, {:.1} observations, {} live feeds, {} insights",
            self.active_students,
            self.engagement,
            self.peak_engagement,
            self.dominant_mood,
            self.total_frames,
            self.active_feeds.len(),
            self.insights.len()
        )
    }
}
