//! Tolerant JSON extraction for classifier replies.
//!
//! Classifier output is model text, so it may wrap the JSON object in code
//! fences or prose. A cascade of increasingly permissive patterns pulls out
//! candidate objects; the first candidate that parses and carries a valid
//! `next_speaker` wins.

use once_cell::sync::Lazy;
use regex::Regex;

use parley_core::NextSpeaker;

/// Patterns tried in order, strictest first. The first targets a flat object
/// naming a valid speaker, the second any object mentioning both expected
/// keys, the last any brace-delimited span at all.
static JSON_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"\{[^{}]*"next_speaker"\s*:\s*"(?:user|model)"[^{}]*\}"#).unwrap(),
        Regex::new(r#"(?s)\{.*?"reasoning".*?"next_speaker".*?\}"#).unwrap(),
        Regex::new(r"(?s)\{.*\}").unwrap(),
    ]
});

/// A successfully extracted classifier verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedVerdict {
    pub next_speaker: NextSpeaker,
    pub reasoning: String,
}

/// Pull the speaker verdict out of raw classifier text. Returns `None` when
/// no candidate parses into an object with a valid `next_speaker`.
pub fn extract_verdict(response_text: &str) -> Option<ExtractedVerdict> {
    for pattern in JSON_PATTERNS.iter() {
        for m in pattern.find_iter(response_text) {
            let Ok(data) = serde_json::from_str::<serde_json::Value>(m.as_str()) else {
                continue;
            };
            let speaker = match data.get("next_speaker").and_then(|v| v.as_str()) {
                Some("user") => NextSpeaker::User,
                Some("model") => NextSpeaker::Model,
                _ => continue,
            };
            let reasoning = data
                .get("reasoning")
                .and_then(|v| v.as_str())
                .unwrap_or("No reasoning provided")
                .to_string();
            return Some(ExtractedVerdict {
                next_speaker: speaker,
                reasoning,
            });
        }
    }
    None
}
