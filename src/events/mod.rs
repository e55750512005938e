//! Wire-level events received from the session backend.

pub mod emotion;
pub mod events;

pub use emotion::{Emotion, Mood};
pub use events::{EmotionUpdate, EnvelopeError, FeedImage, TelemetryEvent};
