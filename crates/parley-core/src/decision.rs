use serde::{Deserialize, Serialize};

/// Who should act next in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextSpeaker {
    User,
    Model,
}

/// The outcome of next-speaker detection for one turn. Ephemeral — produced
/// per turn, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerDecision {
    pub next_speaker: NextSpeaker,
    /// Free-text justification, surfaced for observability.
    pub reasoning: String,
    /// True only when `next_speaker == Model` and continuation is safe to
    /// trigger automatically.
    pub should_continue: bool,
}

impl SpeakerDecision {
    /// A decision derived from a speaker: `should_continue` is computed, never
    /// trusted from the classifier.
    pub fn new(next_speaker: NextSpeaker, reasoning: impl Into<String>) -> Self {
        Self {
            next_speaker,
            reasoning: reasoning.into(),
            should_continue: next_speaker == NextSpeaker::Model,
        }
    }

    /// The conservative fallback: yield to the user, do not continue.
    pub fn yield_to_user(reasoning: impl Into<String>) -> Self {
        Self {
            next_speaker: NextSpeaker::User,
            reasoning: reasoning.into(),
            should_continue: false,
        }
    }

    /// Model speaks next but must wait for an external collaborator (pending
    /// tool execution) before continuation is safe.
    pub fn model_waits(reasoning: impl Into<String>) -> Self {
        Self {
            next_speaker: NextSpeaker::Model,
            reasoning: reasoning.into(),
            should_continue: false,
        }
    }
}
