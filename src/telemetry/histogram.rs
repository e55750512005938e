//! Decay-on-mismatch emotion histogram.
//!
//! Each observation adds 1 to its bucket and erodes every other bucket by
//! `EMOTION_DECAY_STEP`, floored at 0. Nothing decays with elapsed time.

use crate::assets::EMOTION_DECAY_STEP;
use crate::events::{Emotion, Mood};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmotionHistogram {
    weights: [f64; Emotion::COUNT],
}

impl EmotionHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, emotion: Emotion) {
        for (i, weight) in self.weights.iter_mut().enumerate() {
            if i == emotion.index() {
                *weight += 1.0;
            } else {
                *weight = (*weight - EMOTION_DECAY_STEP).max(0.0);
            }
        }
    }

    pub fn weight(&self, emotion: Emotion) -> f64 {
        self.weights[emotion.index()]
    }

    /// `(emotion, weight)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.into_iter().map(|e| (e, self.weight(e)))
    }

    /// Sum of all weights; a proxy for the number of observations.
    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Heaviest bucket; earlier buckets win ties. `Undetermined` while every
    /// weight is zero.
    pub fn dominant(&self) -> Mood {
        let mut best: Option<(Emotion, f64)> = None;
        for (emotion, weight) in self.entries() {
            if weight > 0.0 && best.is_none_or(|(_, w)| weight > w) {
                best = Some((emotion, weight));
            }
        }
        best.map_or(Mood::Undetermined, |(e, _)| Mood::Dominant(e))
    }
}
