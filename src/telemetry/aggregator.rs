//! Telemetry aggregator
//!
//! Owns the canonical [`TelemetryState`] of one dashboard session and folds
//! events into it strictly in arrival order. Readers subscribe to the state
//! through a `watch` channel and evaluate the pure queries themselves, so
//! time-dependent views (feed freshness) are computed at read time.

use crate::events::{Mood, TelemetryEvent};
use crate::pipeline::clock::{Clock, SystemClock};
use crate::pipeline::health::PipelineHealth;
use crate::telemetry::feeds::ActiveFeed;
use crate::telemetry::snapshot::DashboardSnapshot;
use crate::telemetry::state::TelemetryState;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::watch;

pub struct TelemetryAggregator {
    state: watch::Sender<TelemetryState>,
    clock: Arc<dyn Clock>,
    health: Arc<PipelineHealth>,
}

impl TelemetryAggregator {
    pub fn new() -> Self {
        Self::with_state(TelemetryState::new(), Arc::new(SystemClock), Arc::new(PipelineHealth::new()))
    }

    pub fn with_state(initial: TelemetryState, clock: Arc<dyn Clock>, health: Arc<PipelineHealth>) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state, clock, health }
    }

    pub fn subscribe(&self) -> watch::Receiver<TelemetryState> {
        self.state.subscribe()
    }

    pub fn health(&self) -> &Arc<PipelineHealth> {
        &self.health
    }

    /// Folds one event into state. The only mutator.
    pub fn dispatch(&mut self, event: TelemetryEvent) {
        let now = self.clock.now();
        debug!("Dispatching {}", event.kind());
        self.state.send_modify(|state| state.apply(event, now));
        self.health.record_message();
    }

    /// Parses and dispatches a raw text message. Malformed payloads are
    /// logged and dropped; state is left untouched.
    pub fn dispatch_raw(&mut self, text: &str) -> bool {
        match TelemetryEvent::parse(text) {
            Ok(event) => {
                self.dispatch(event);
                true
            }
            Err(e) => {
                warn!("Dropping malformed message: {}", e);
                self.health.record_malformed();
                false
            }
        }
    }

    pub fn dominant_mood(&self) -> Mood {
        self.state.borrow().dominant_mood()
    }

    pub fn peak_engagement(&self) -> f64 {
        self.state.borrow().peak_engagement()
    }

    pub fn total_frames(&self) -> f64 {
        self.state.borrow().total_frames()
    }

    pub fn active_feeds(&self) -> Vec<ActiveFeed> {
        self.state.borrow().active_feeds(self.clock.now())
    }

    pub fn smoothed_engagement(&self) -> f64 {
        self.state.borrow().smoothed_engagement
    }

    pub fn active_students(&self) -> u32 {
        self.state.borrow().active_students
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot::of(&self.state.borrow(), self.clock.now())
    }
}

impl Default for TelemetryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Emotion;
    use crate::pipeline::clock::ManualClock;
    use chrono::{DateTime, Utc};
    use std::time::Duration;

    fn manual() -> (TelemetryAggregator, ManualClock) {
        let start: DateTime<Utc> = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let clock = ManualClock::new(start);
        let agg = TelemetryAggregator::with_state(
            TelemetryState::new(),
            Arc::new(clock.clone()),
            Arc::new(PipelineHealth::new()),
        );
        (agg, clock)
    }

    fn emotion_update(pid: &str, emotion: &str, score: f64) -> String {
        format!(
            r#"{{"event":"emotion_update","data":{{"participant_id":"{}","emotion":"{}","engagement_score":{}}},"image":"/9j/AA=="}}"#,
            pid, emotion, score
        )
    }

    #[test]
    fn test_malformed_messages_are_dropped_and_processing_continues() {
        let (mut agg, _) = manual();
        assert!(!agg.dispatch_raw("{garbage"));
        assert!(!agg.dispatch_raw(r#"{"event":"student_count","data":{"count":-1}}"#));
        assert!(agg.dispatch_raw(r#"{"event":"student_count","data":{"count":12}}"#));
        assert_eq!(agg.active_students(), 12);

        let summary = agg.health().summary();
        assert_eq!(summary.malformed_messages, 2);
        assert_eq!(summary.messages_received, 1);
    }

    #[test]
    fn test_feed_freshness_follows_clock() {
        let (mut agg, clock) = manual();
        agg.dispatch_raw(&emotion_update("student_jane", "happy", 80.0));
        assert_eq!(agg.active_feeds().len(), 1);

        clock.advance(Duration::from_millis(4999));
        assert_eq!(agg.active_feeds().len(), 1);

        clock.advance(Duration::from_millis(1));
        assert!(agg.active_feeds().is_empty());
        assert_eq!(agg.subscribe().borrow().feeds.len(), 1);
    }

    #[test]
    fn test_blank_feed_fields_are_treated_as_absent() {
        let (mut agg, _) = manual();
        assert!(agg.dispatch_raw(
            r#"{"event":"emotion_update","data":{"participant_id":"","emotion":"happy"},"image":""}"#
        ));
        assert!(agg.active_feeds().is_empty());
        assert_eq!(agg.dominant_mood(), Mood::Dominant(Emotion::Happy));
    }

    #[test]
    fn test_insight_feed_bounded_newest_first() {
        let (mut agg, _) = manual();
        for i in 0..9 {
            agg.dispatch_raw(&format!(r#"{{"event":"new_insight","data":{{"message":"m{}"}}}}"#, i));
        }
        let snap = agg.snapshot();
        let messages: Vec<&str> = snap.insights.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["m8", "m7", "m6", "m5", "m4"]);
    }

    #[test]
    fn test_queries_over_stream() {
        let (mut agg, _) = manual();
        assert_eq!(agg.dominant_mood(), Mood::Undetermined);

        agg.dispatch_raw(&emotion_update("student_a", "sad", 30.0));
        agg.dispatch_raw(&emotion_update("student_b", "Happy", 90.0));
        agg.dispatch_raw(&emotion_update("student_a", "happy", 70.0));

        assert_eq!(agg.dominant_mood(), Mood::Dominant(Emotion::Happy));
        assert_eq!(agg.peak_engagement(), 90.0);
        // 6 → round(18+4.8)=23 → round(14+18.4)=32
        assert_eq!(agg.smoothed_engagement(), 32.0);
        // happy 2.0, sad 0.8
        assert!((agg.total_frames() - 2.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_subscribers_see_every_dispatch() {
        let (mut agg, _) = manual();
        let mut rx = agg.subscribe();
        agg.dispatch(TelemetryEvent::StudentCount { count: 4 });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().active_students, 4);
    }
}
