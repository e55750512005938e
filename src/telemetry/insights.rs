use crate::assets::INSIGHT_CAPACITY;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightEvent {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// The most recent insights, newest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsightFeed {
    items: VecDeque<InsightEvent>,
}

impl InsightFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: String, now: DateTime<Utc>) {
        self.items.push_front(InsightEvent {
            id: Uuid::new_v4(),
            message,
            created_at: now,
        });
        self.items.truncate(INSIGHT_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InsightEvent> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_keeps_five_newest_first() {
        let now = Utc::now();
        let mut feed = InsightFeed::new();
        for i in 1..=8 {
            feed.push(format!("insight {}", i), now);
        }
        let messages: Vec<&str> = feed.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["insight 8", "insight 7", "insight 6", "insight 5", "insight 4"]);
    }

    #[test]
    fn test_ids_are_unique() {
        let now = Utc::now();
        let mut feed = InsightFeed::new();
        feed.push("same".into(), now);
        feed.push("same".into(), now);
        let ids: Vec<Uuid> = feed.iter().map(|i| i.id).collect();
        assert_ne!(ids[0], ids[1]);
    }
}
