use serde::Serialize;
use std::fmt;

/// The fixed emotion buckets, in declaration order.
///
/// Declaration order matters: it is the tie-break order for the dominant mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Neutral,
    Surprise,
    Sad,
    Angry,
    Disgust,
    Fear,
}

impl Emotion {
    pub const COUNT: usize = 7;

    pub const ALL: [Emotion; Emotion::COUNT] = [
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Surprise,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
    ];

    /// Case-insensitive match against the bucket names.
    pub fn from_label(label: &str) -> Option<Emotion> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(label.trim()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Neutral => "neutral",
            Emotion::Surprise => "surprise",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
        }
    }

    /// Position in declaration order, used as the histogram bucket index.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dominant mood of the class. Never guessed from zero evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Undetermined,
    #[serde(untagged)]
    Dominant(Emotion),
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mood::Undetermined => f.write_str("undetermined"),
            Mood::Dominant(e) => e.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_is_case_insensitive() {
        assert_eq!(Emotion::from_label("Happy"), Some(Emotion::Happy));
        assert_eq!(Emotion::from_label("FEAR"), Some(Emotion::Fear));
        assert_eq!(Emotion::from_label("fatigued"), None);
        assert_eq!(Emotion::from_label(""), None);
    }

    #[test]
    fn test_declaration_order() {
        for (i, e) in Emotion::ALL.iter().enumerate() {
            assert_eq!(e.index(), i);
        }
    }

    #[test]
    fn test_mood_serialization() {
        assert_eq!(serde_json::to_string(&Mood::Undetermined).unwrap(), "\"undetermined\"");
        assert_eq!(serde_json::to_string(&Mood::Dominant(Emotion::Sad)).unwrap(), "\"sad\"");
    }
}
