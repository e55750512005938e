//! Inbound event envelope: `{event, data, image?}`.
//!
//! The schema is additive. Unknown event kinds and absent optional fields
//! are valid; only structurally broken payloads are errors.

use crate::utils::net::endpoint::ParticipantId;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("payload is not a valid envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("{event}: missing data object")]
    MissingData { event: &'static str },

    #[error("{event}: malformed data: {source}")]
    Data {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Deserialize)]
struct StudentCountData {
    count: u32,
}

#[derive(Deserialize)]
struct EmotionUpdateData {
    #[serde(default)]
    participant_id: Option<String>,
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default)]
    engagement_score: Option<f64>,
}

#[derive(Deserialize)]
struct NewInsightData {
    message: String,
}

/// A camera frame as relayed by the backend: base64 text, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeedImage(String);

impl FeedImage {
    pub fn new(base64: impl Into<String>) -> Self {
        Self(base64.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw encoded image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.0)
    }

    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmotionUpdate {
    pub participant_id: Option<ParticipantId>,
    /// Emotion label as sent; matched against the buckets later.
    pub emotion: Option<String>,
    pub engagement_score: Option<f64>,
    pub image: Option<FeedImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    StudentCount { count: u32 },
    EmotionUpdate(EmotionUpdate),
    NewInsight { message: String },
    /// Forward-compatible no-op.
    Unknown { event: String },
}

impl TelemetryEvent {
    pub fn parse(text: &str) -> Result<TelemetryEvent, EnvelopeError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(EnvelopeError::Envelope)?;

        match envelope.event.as_str() {
            "student_count" => {
                let data: StudentCountData = data_of("student_count", envelope.data)?;
                Ok(TelemetryEvent::StudentCount { count: data.count })
            }
            "emotion_update" => {
                let data: EmotionUpdateData = data_of("emotion_update", envelope.data)?;
                Ok(TelemetryEvent::EmotionUpdate(EmotionUpdate {
                    participant_id: data.participant_id.map(ParticipantId::from_wire),
                    emotion: data.emotion,
                    engagement_score: data.engagement_score,
                    image: envelope.image.map(FeedImage::new),
                }))
            }
            "new_insight" => {
                let data: NewInsightData = data_of("new_insight", envelope.data)?;
                Ok(TelemetryEvent::NewInsight { message: data.message })
            }
            _ => Ok(TelemetryEvent::Unknown { event: envelope.event }),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            TelemetryEvent::StudentCount { .. } => "student_count",
            TelemetryEvent::EmotionUpdate(_) => "emotion_update",
            TelemetryEvent::NewInsight { .. } => "new_insight",
            TelemetryEvent::Unknown { event } => event,
        }
    }
}

fn data_of<T: for<'de> Deserialize<'de>>(event: &'static str, data: Option<Value>) -> Result<T, EnvelopeError> {
    let data = match data {
        Some(Value::Null) | None => return Err(EnvelopeError::MissingData { event }),
        Some(data) => data,
    };
    serde_json::from_value(data).map_err(|source| EnvelopeError::Data { event, source })
}
