//! Simulated emotion detection
//!
//! The user picks the emotion they want the assistant to assume. The
//! selection adds a tone hint to the system instruction of later requests.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Happy,
    Confused,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 3] = [Emotion::Happy, Emotion::Confused, Emotion::Neutral];

    pub fn name(&self) -> &'static str {
        match self {
            Emotion::Happy => "Happy",
            Emotion::Confused => "Confused",
            Emotion::Neutral => "Neutral",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Emotion::Happy => "😊",
            Emotion::Confused => "🤔",
            Emotion::Neutral => "😐",
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.emoji(), self.name())
    }

    /// Extra guidance appended to the system instruction
    pub fn tone_hint(&self) -> &'static str {
        match self {
            Emotion::Happy => {
                "The user appears to be in a good mood. Keep a warm, upbeat tone."
            }
            Emotion::Confused => {
                "The user appears confused. Slow down, break the answer into \
                 small steps and check the key terms are explained."
            }
            Emotion::Neutral => "The user appears calm. Keep a neutral, matter-of-fact tone.",
        }
    }
}
