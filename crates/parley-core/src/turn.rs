use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    /// A tool-execution result appended by the caller, never by the core.
    #[serde(rename = "function")]
    FunctionResult,
}

/// A single content unit within a turn. Exactly one kind per part.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    /// Internal reasoning narration, distinct from the user-facing answer.
    Thought {
        text: String,
    },
    /// A model-issued request to invoke an external capability.
    FunctionCall {
        name: String,
        args: serde_json::Value,
    },
    /// The opaque result of a function call, keyed by the invoking call's name.
    FunctionResult {
        name: String,
        response: serde_json::Value,
    },
}

impl Part {
    /// Whether this part carries any visible text. Function calls and results
    /// never do; text and thought parts do only when non-blank.
    pub fn has_text(&self) -> bool {
        match self {
            Part::Text { text } | Part::Thought { text } => !text.trim().is_empty(),
            Part::FunctionCall { .. } | Part::FunctionResult { .. } => false,
        }
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, Part::FunctionCall { .. })
    }
}

/// One exchange unit in a transcript. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            role,
            parts,
            timestamp: Utc::now(),
        }
    }

    /// A user turn containing a single plain-text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::Text { text: text.into() }])
    }

    /// A model turn containing a single plain-text part.
    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::Text { text: text.into() }])
    }

    /// A function-result turn answering a prior function call.
    pub fn function_result(name: impl Into<String>, response: serde_json::Value) -> Self {
        Self::new(
            Role::FunctionResult,
            vec![Part::FunctionResult {
                name: name.into(),
                response,
            }],
        )
    }

    /// All plain (non-thought) text joined together.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All thought text joined together, or `None` when there is none.
    pub fn thought_content(&self) -> Option<String> {
        let thoughts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Thought { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if thoughts.is_empty() {
            None
        } else {
            Some(thoughts.join("\n"))
        }
    }

    /// Whether any part carries a pending function call.
    pub fn has_function_call(&self) -> bool {
        self.parts.iter().any(Part::is_function_call)
    }

    /// Whether the turn produced nothing visible: no part has non-blank text.
    pub fn is_blank(&self) -> bool {
        !self.parts.iter().any(Part::has_text)
    }
}

/// Ordered record of all turns exchanged in one conversation.
///
/// Append-only: turns are never reordered or mutated in place. Owned
/// exclusively by the session that created it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The most recent model turn, scanning from the end backward.
    pub fn last_model_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::Model)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop all turns. Used when a session restarts logically.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_detection() {
        let turn = Turn::new(
            Role::Model,
            vec![
                Part::Text { text: "  ".into() },
                Part::Thought { text: "".into() },
            ],
        );
        assert!(turn.is_blank());

        let turn = Turn::model_text("done");
        assert!(!turn.is_blank());
    }

    #[test]
    fn test_function_call_only_turn_is_blank_but_flagged() {
        let turn = Turn::new(
            Role::Model,
            vec![Part::FunctionCall {
                name: "compute_stats".into(),
                args: serde_json::json!({"column": "price"}),
            }],
        );
        assert!(turn.is_blank());
        assert!(turn.has_function_call());
    }

    #[test]
    fn test_text_and_thought_separation() {
        let turn = Turn::new(
            Role::Model,
            vec![
                Part::Thought {
                    text: "planning".into(),
                },
                Part::Text {
                    text: "answer".into(),
                },
            ],
        );
        assert_eq!(turn.text_content(), "answer");
        assert_eq!(turn.thought_content().as_deref(), Some("planning"));
    }

    #[test]
    fn test_last_model_turn_scans_backward() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user_text("hi"));
        transcript.push(Turn::model_text("first"));
        transcript.push(Turn::user_text("more"));
        transcript.push(Turn::model_text("second"));
        transcript.push(Turn::function_result("f", serde_json::json!({})));

        let last = transcript.last_model_turn().unwrap();
        assert_eq!(last.text_content(), "second");
    }

    #[test]
    fn test_role_function_result_serializes_as_function() {
        let turn = Turn::function_result("f", serde_json::json!({"ok": true}));
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "function");
    }
}
