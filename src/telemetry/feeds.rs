//! Latest camera frame per participant.
//!
//! Entries are overwritten, never merged, and never swept. Whether a feed is
//! "active" is decided at read time against `FRESHNESS_WINDOW`.

use crate::assets::FRESHNESS_WINDOW;
use crate::events::FeedImage;
use crate::utils::net::endpoint::ParticipantId;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    pub image: FeedImage,
    pub emotion: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl FeedEntry {
    /// `now - received_at < FRESHNESS_WINDOW`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let window = TimeDelta::from_std(FRESHNESS_WINDOW).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.received_at) < window
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveFeed {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub image: FeedImage,
    pub emotion: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveFeedCache {
    entries: BTreeMap<ParticipantId, FeedEntry>,
}

impl LiveFeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, participant: ParticipantId, image: FeedImage, emotion: Option<String>, now: DateTime<Utc>) {
        self.entries.insert(
            participant,
            FeedEntry {
                image,
                emotion,
                received_at: now,
            },
        );
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<&FeedEntry> {
        self.entries.get(participant)
    }

    /// Every cached entry, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh entries only, ordered by participant id.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<ActiveFeed> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_fresh(now))
            .map(|(id, entry)| ActiveFeed {
                participant_id: id.clone(),
                display_name: id.display_name().to_string(),
                image: entry.image.clone(),
                emotion: entry.emotion.clone(),
                received_at: entry.received_at,
            })
            .collect()
    }
}
