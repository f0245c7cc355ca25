use std::sync::Arc;

use tracing::{debug, warn};

use parley_config::schema::ClassifierConfig;
use parley_core::{SpeakerDecision, Transcript, Turn};
use parley_gateway::{GenerationConfig, ModelGateway};

use crate::extract::extract_verdict;
use crate::prompts;

/// Decides who should speak next after a model turn.
///
/// Structural rules handle the unambiguous cases without a network call;
/// everything else goes to a cheap classification side call. Detection never
/// fails the caller's turn: any classifier problem collapses into the
/// conservative "yield to the user" decision.
pub struct SpeakerDetector {
    gateway: Arc<dyn ModelGateway>,
    config: ClassifierConfig,
}

impl SpeakerDetector {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: ClassifierConfig) -> Self {
        Self { gateway, config }
    }

    /// Run detection over the transcript. Returns `None` when there is
    /// nothing to decide about: an empty transcript, or no model turn yet.
    pub async fn detect(&self, transcript: &Transcript) -> Option<SpeakerDecision> {
        if transcript.is_empty() {
            return None;
        }

        // A fresh tool result always goes back to the model, ahead of any
        // inspection of the model's own turns.
        if let Some(last) = transcript.last() {
            if last.role == parley_core::Role::FunctionResult {
                return Some(SpeakerDecision::new(
                    parley_core::NextSpeaker::Model,
                    "Function/tool response received, model should process the result",
                ));
            }
        }

        let last_model = transcript.last_model_turn()?;

        // Unresolved function calls park the conversation: the model speaks
        // next, but only once the caller has executed the tools.
        if last_model.has_function_call() {
            return Some(SpeakerDecision::model_waits(
                "Model made tool calls, waiting for tool responses",
            ));
        }

        if last_model.is_blank() {
            return Some(SpeakerDecision::new(
                parley_core::NextSpeaker::Model,
                "Last model response was empty, model should continue",
            ));
        }

        Some(self.classify(transcript).await)
    }

    /// Ask the classifier model who should speak next. Infallible by
    /// construction: parse failures and gateway errors both degrade to the
    /// conservative decision.
    async fn classify(&self, transcript: &Transcript) -> SpeakerDecision {
        let mut analysis = transcript.clone();
        analysis.push(Turn::user_text(prompts::CHECK_PROMPT));

        let config = GenerationConfig {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_output_tokens: Some(self.config.max_output_tokens),
            system_instruction: Some(prompts::CLASSIFIER_SYSTEM_INSTRUCTION.to_string()),
            tools: Vec::new(),
            include_thoughts: false,
        };

        let turn = match self.gateway.generate(&analysis, &config).await {
            Ok(turn) => turn,
            Err(e) => {
                warn!(error = %e, "next-speaker classification call failed");
                return SpeakerDecision::yield_to_user(format!("Error during detection: {e}"));
            }
        };

        let text = turn.text_content();
        match extract_verdict(&text) {
            Some(verdict) => {
                debug!(
                    next_speaker = ?verdict.next_speaker,
                    reasoning = %verdict.reasoning,
                    "next-speaker classification"
                );
                SpeakerDecision::new(verdict.next_speaker, verdict.reasoning)
            }
            None => {
                warn!(response = %text, "could not parse next-speaker classification response");
                SpeakerDecision::yield_to_user("Failed to parse next speaker detection response")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{NextSpeaker, Part, Role};
    use parley_gateway::MockGateway;

    fn detector(gateway: MockGateway) -> SpeakerDetector {
        SpeakerDetector::new(Arc::new(gateway), ClassifierConfig::default())
    }

    #[tokio::test]
    async fn test_empty_transcript_yields_no_decision() {
        let d = detector(MockGateway::new());
        assert!(d.detect(&Transcript::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_function_result_short_circuits() {
        let gateway = MockGateway::new();
        let d = SpeakerDetector::new(Arc::new(gateway.clone()), ClassifierConfig::default());

        let mut t = Transcript::new();
        t.push(Turn::user_text("analyze sales.xlsx"));
        t.push(Turn::new(
            Role::Model,
            vec![Part::FunctionCall {
                name: "load_file".into(),
                args: serde_json::json!({"name": "sales.xlsx"}),
            }],
        ));
        t.push(Turn::function_result("load_file", serde_json::json!({"rows": 40})));

        let decision = d.detect(&t).await.unwrap();
        assert_eq!(decision.next_speaker, NextSpeaker::Model);
        assert!(decision.should_continue);
        // No classification call was made.
        assert_eq!(gateway.request_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_function_call_waits() {
        let d = detector(MockGateway::new());

        let mut t = Transcript::new();
        t.push(Turn::user_text("plot the revenue column"));
        t.push(Turn::new(
            Role::Model,
            vec![
                Part::Thought {
                    text: "need the data first".into(),
                },
                Part::FunctionCall {
                    name: "read_column".into(),
                    args: serde_json::json!({"column": "revenue"}),
                },
            ],
        ));

        let decision = d.detect(&t).await.unwrap();
        assert_eq!(decision.next_speaker, NextSpeaker::Model);
        assert!(!decision.should_continue);
    }

    #[tokio::test]
    async fn test_blank_model_turn_continues() {
        let d = detector(MockGateway::new());

        let mut t = Transcript::new();
        t.push(Turn::user_text("hello"));
        t.push(Turn::new(Role::Model, vec![Part::Text { text: "  ".into() }]));

        let decision = d.detect(&t).await.unwrap();
        assert_eq!(decision.next_speaker, NextSpeaker::Model);
        assert!(decision.should_continue);
    }

    #[tokio::test]
    async fn test_no_model_turn_yields_no_decision() {
        let d = detector(MockGateway::new());
        let mut t = Transcript::new();
        t.push(Turn::user_text("hello"));
        assert!(d.detect(&t).await.is_none());
    }

    #[tokio::test]
    async fn test_classification_call_parsed() {
        let gateway = MockGateway::new()
            .with_text_turn(r#"{"reasoning": "mid-task", "next_speaker": "model"}"#);
        let d = SpeakerDetector::new(Arc::new(gateway.clone()), ClassifierConfig::default());

        let mut t = Transcript::new();
        t.push(Turn::user_text("summarize the file"));
        t.push(Turn::model_text("Loading the file now, I'll summarize next."));

        let decision = d.detect(&t).await.unwrap();
        assert_eq!(decision.next_speaker, NextSpeaker::Model);
        assert!(decision.should_continue);
        assert_eq!(decision.reasoning, "mid-task");

        // The side call appends the check prompt and disables tools.
        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        let (sent, config) = &requests[0];
        assert_eq!(sent.len(), 3);
        assert!(sent.last().unwrap().text_content().contains("who should speak next"));
        assert!(config.tools.is_empty());
        assert_eq!(config.max_output_tokens, Some(200));
    }

    #[tokio::test]
    async fn test_unparsable_classification_falls_back() {
        let gateway = MockGateway::new().with_text_turn("the model should go next, probably");
        let d = detector(gateway);

        let mut t = Transcript::new();
        t.push(Turn::user_text("hi"));
        t.push(Turn::model_text("Working on it."));

        let decision = d.detect(&t).await.unwrap();
        assert_eq!(decision.next_speaker, NextSpeaker::User);
        assert!(!decision.should_continue);
    }

    #[tokio::test]
    async fn test_classifier_error_falls_back() {
        let gateway = MockGateway::new().with_error("timeout");
        let d = detector(gateway);

        let mut t = Transcript::new();
        t.push(Turn::user_text("hi"));
        t.push(Turn::model_text("Done? Maybe."));

        let decision = d.detect(&t).await.unwrap();
        assert_eq!(decision.next_speaker, NextSpeaker::User);
        assert!(!decision.should_continue);
        assert!(decision.reasoning.contains("timeout"));
    }

    #[tokio::test]
    async fn test_function_call_beats_blankness() {
        // A function-call-only turn is blank too; the pending-call rule must
        // win so continuation is not triggered past unexecuted tools.
        let d = detector(MockGateway::new());

        let mut t = Transcript::new();
        t.push(Turn::user_text("go"));
        t.push(Turn::new(
            Role::Model,
            vec![Part::FunctionCall {
                name: "f".into(),
                args: serde_json::json!({}),
            }],
        ));

        let decision = d.detect(&t).await.unwrap();
        assert!(!decision.should_continue);
    }
}
