//! Bounded engagement time series and its smoothed scalar.

use crate::assets::{HISTORY_CAPACITY, PREFILL_SPACING, SMOOTHING_FACTOR};
use chrono::{DateTime, Local, TimeDelta, Utc};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementSample {
    /// Local wall-clock label, `HH:MM:SS`.
    pub time_label: String,
    pub score: f64,
}

impl EngagementSample {
    pub fn at(time: DateTime<Utc>, score: f64) -> Self {
        Self {
            time_label: time.with_timezone(&Local).format("%H:%M:%S").to_string(),
            score,
        }
    }
}

/// FIFO of the most recent samples, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementHistory {
    samples: VecDeque<EngagementSample>,
}

impl EngagementHistory {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    /// A full window of zero samples spaced `PREFILL_SPACING` apart, the last
    /// one `PREFILL_SPACING` before `now`.
    pub fn prefilled(now: DateTime<Utc>) -> Self {
        let mut history = Self::new();
        let spacing = TimeDelta::from_std(PREFILL_SPACING).unwrap_or_else(|_| TimeDelta::zero());
        for i in (1..=HISTORY_CAPACITY as i32).rev() {
            history.push(EngagementSample::at(now - spacing * i, 0.0));
        }
        history
    }

    pub fn push(&mut self, sample: EngagementSample) {
        self.samples.push_back(sample);
        while self.samples.len() > HISTORY_CAPACITY {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngagementSample> {
        self.samples.iter()
    }

    /// Highest score, ignoring NaN entries; 0 when nothing is usable.
    pub fn peak(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.score)
            .filter(|s| !s.is_nan())
            .fold(None, |max: Option<f64>, s| Some(max.map_or(s, |m| m.max(s))))
            .unwrap_or(0.0)
    }
}

impl Default for EngagementHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// One EMA step, rounded to a whole percentage.
pub fn smooth(previous: f64, score: f64) -> f64 {
    (SMOOTHING_FACTOR * score + (1.0 - SMOOTHING_FACTOR) * previous).round()
}
