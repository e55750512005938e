//! Canonical dashboard state and its transition function.
//!
//! `apply` is the only way state changes. Everything the presentation layer
//! shows is derived from the canonical fields on demand.

use crate::events::{Emotion, EmotionUpdate, Mood, TelemetryEvent};
use crate::telemetry::feeds::{ActiveFeed, LiveFeedCache};
use crate::telemetry::histogram::EmotionHistogram;
use crate::telemetry::history::{smooth, EngagementHistory, EngagementSample};
use crate::telemetry::insights::InsightFeed;
use chrono::{DateTime, Utc};
use log::debug;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelemetryState {
    pub active_students: u32,
    pub smoothed_engagement: f64,
    pub history: EngagementHistory,
    pub emotions: EmotionHistogram,
    pub feeds: LiveFeedCache,
    pub insights: InsightFeed,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a full window of zero samples ending at `now`.
    pub fn with_prefilled_history(now: DateTime<Utc>) -> Self {
        Self {
            history: EngagementHistory::prefilled(now),
            ..Self::default()
        }
    }

    /// `(state, event) -> state'`
    pub fn reduce(mut self, event: TelemetryEvent, now: DateTime<Utc>) -> Self {
        self.apply(event, now);
        self
    }

    /// In-place form of [`TelemetryState::reduce`].
    pub fn apply(&mut self, event: TelemetryEvent, now: DateTime<Utc>) {
        match event {
            TelemetryEvent::StudentCount { count } => self.active_students = count,
            TelemetryEvent::EmotionUpdate(update) => self.apply_emotion_update(update, now),
            TelemetryEvent::NewInsight { message } => self.insights.push(message, now),
            TelemetryEvent::Unknown { event } => debug!("ignoring unknown event kind {:?}", event),
        }
    }

    fn apply_emotion_update(&mut self, update: EmotionUpdate, now: DateTime<Utc>) {
        let EmotionUpdate {
            participant_id,
            emotion,
            engagement_score,
            image,
        } = update;

        // empty strings count as absent
        let participant = participant_id.filter(|p| !p.as_str().is_empty());
        let image = image.filter(|i| !i.is_empty());
        if let (Some(participant), Some(image)) = (participant, image) {
            self.feeds.update(participant, image, emotion.clone(), now);
        }

        if let Some(score) = engagement_score {
            self.smoothed_engagement = smooth(self.smoothed_engagement, score);
            self.history.push(EngagementSample::at(now, score));
        }

        if let Some(label) = emotion {
            match Emotion::from_label(&label) {
                Some(e) => self.emotions.observe(e),
                None => debug!("emotion {:?} matches no bucket", label),
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn dominant_mood(&self) -> Mood {
        self.emotions.dominant()
    }

    pub fn peak_engagement(&self) -> f64 {
        self.history.peak()
    }

    pub fn total_frames(&self) -> f64 {
        self.emotions.total()
    }

    pub fn active_feeds(&self, now: DateTime<Utc>) -> Vec<ActiveFeed> {
        self.feeds.active(now)
    }
}
