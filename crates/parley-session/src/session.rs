use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use parley_config::schema::{AgentConfig, ParleyConfig};
use parley_core::{FunctionDecl, Result, SpeakerDecision, Transcript, Turn};
use parley_gateway::{GenerationConfig, ModelGateway};

use crate::controller::TurnController;
use crate::prompts;

/// Everything a front-end needs from one processed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The model turn that was appended to the transcript.
    pub turn: Turn,
    pub should_continue: bool,
    pub decision: Option<SpeakerDecision>,
}

/// One conversation: a transcript, the gateway it talks through, and the
/// controller that budgets its turns.
///
/// Sessions are single-writer. Callers that share one across tasks wrap it
/// in a mutex; see [`crate::registry::SessionRegistry`].
pub struct ChatSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    gateway: Arc<dyn ModelGateway>,
    agent: AgentConfig,
    system_prompt: String,
    transcript: Transcript,
    controller: TurnController,
}

impl ChatSession {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &ParleyConfig) -> Self {
        Self::with_id(Uuid::new_v4(), gateway, config)
    }

    pub fn with_id(id: Uuid, gateway: Arc<dyn ModelGateway>, config: &ParleyConfig) -> Self {
        let system_prompt = config.resolve_system_prompt(prompts::DEFAULT_SYSTEM_PROMPT);
        let controller = TurnController::new(
            gateway.clone(),
            config.classifier.clone(),
            config.agent.max_session_turns,
        );
        Self {
            id,
            created_at: Utc::now(),
            gateway,
            agent: config.agent.clone(),
            system_prompt,
            transcript: Transcript::new(),
            controller,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn tools(&self) -> &[FunctionDecl] {
        &self.agent.tools
    }

    pub fn current_turn(&self) -> u64 {
        self.controller.current_turn()
    }

    /// Process one user query: append it, obtain a model turn, append that
    /// verbatim, then run continuation control when asked.
    ///
    /// On gateway failure the user turn stays in the transcript, so a retry
    /// does not require the caller to resend the text.
    pub async fn submit(&mut self, query: &str, check_continue: bool) -> Result<TurnOutcome> {
        self.transcript.push(Turn::user_text(query));

        let config = self.primary_config();
        let turn = self.gateway.generate(&self.transcript, &config).await?;
        self.transcript.push(turn.clone());

        let (should_continue, decision) = if check_continue {
            self.controller.advance(&self.transcript, true).await
        } else {
            (false, None)
        };

        debug!(
            session_id = %self.id,
            turn = self.controller.current_turn(),
            should_continue,
            "processed turn"
        );

        Ok(TurnOutcome {
            turn,
            should_continue,
            decision,
        })
    }

    /// Submit the canned continuation prompt on the user's behalf.
    pub async fn submit_continue(&mut self) -> Result<TurnOutcome> {
        self.submit(prompts::CONTINUE_PROMPT, true).await
    }

    /// Compose the opening greeting: the intro line plus a listing of the
    /// configured data directory. Appended to the transcript as a model turn
    /// without a gateway call, so a fresh session always greets instantly.
    pub fn greet(&mut self) -> String {
        let mut intro = String::from(prompts::INTRO_MESSAGE);
        intro.push_str("\n\nAvailable data files:");

        for name in list_data_files(&self.agent.data_dir) {
            intro.push_str("\n  - ");
            intro.push_str(&name);
        }

        intro.push_str("\n\nHow would you like to analyze the data?");

        self.transcript.push(Turn::model_text(intro.clone()));
        info!(session_id = %self.id, "session greeted");
        intro
    }

    /// Drop the whole transcript and restore the turn budget.
    pub fn clear_history(&mut self) {
        self.transcript.clear();
        self.controller.reset();
    }

    fn primary_config(&self) -> GenerationConfig {
        let mut config = GenerationConfig::primary(&self.agent.model)
            .with_system_instruction(&self.system_prompt)
            .with_tools(self.agent.tools.clone());
        config.temperature = self.agent.temperature;
        config.include_thoughts = self.agent.include_thoughts;
        if self.agent.max_output_tokens > 0 {
            config.max_output_tokens = Some(self.agent.max_output_tokens);
        }
        config
    }
}

/// File names in the data directory, sorted. Missing or unreadable
/// directories produce an empty listing rather than an error.
fn list_data_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_gateway::MockGateway;

    fn session(gateway: MockGateway) -> ChatSession {
        ChatSession::new(Arc::new(gateway), &ParleyConfig::default())
    }

    #[tokio::test]
    async fn test_submit_appends_user_and_model_turns() {
        let gateway = MockGateway::new().with_text_turn("Here is the summary.");
        let mut s = session(gateway);

        let outcome = s.submit("summarize sales.xlsx", false).await.unwrap();
        assert_eq!(outcome.turn.text_content(), "Here is the summary.");
        assert!(!outcome.should_continue);
        assert!(outcome.decision.is_none());

        let turns = s.transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text_content(), "summarize sales.xlsx");
        assert_eq!(turns[1].text_content(), "Here is the summary.");
    }

    #[tokio::test]
    async fn test_gateway_error_keeps_user_turn() {
        let gateway = MockGateway::new().with_error("rate limited");
        let mut s = session(gateway);

        let err = s.submit("hello", false).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));

        // Retry works without resending: the user turn survived.
        assert_eq!(s.transcript().len(), 1);
        assert_eq!(s.transcript().last().unwrap().text_content(), "hello");
    }

    #[tokio::test]
    async fn test_submit_with_check_continue_runs_detection() {
        let gateway = MockGateway::new()
            .with_text_turn("Loading the file, one moment.")
            .with_text_turn(r#"{"reasoning": "mid-task", "next_speaker": "model"}"#);
        let mut s = session(gateway);

        let outcome = s.submit("analyze the data", true).await.unwrap();
        assert!(outcome.should_continue);
        assert_eq!(outcome.decision.unwrap().reasoning, "mid-task");
    }

    #[tokio::test]
    async fn test_submit_continue_uses_canned_prompt() {
        let gateway = MockGateway::new()
            .with_text_turn("Continuing.")
            .with_text_turn(r#"{"reasoning": "done", "next_speaker": "user"}"#);
        let mut s = session(gateway);

        let outcome = s.submit_continue().await.unwrap();
        assert!(!outcome.should_continue);
        assert_eq!(s.transcript().turns()[0].text_content(), "Please continue.");
    }

    #[tokio::test]
    async fn test_greet_lists_data_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sales.xlsx"), b"x").unwrap();
        std::fs::write(dir.path().join("inventory.xlsx"), b"x").unwrap();

        let mut config = ParleyConfig::default();
        config.agent.data_dir = dir.path().to_path_buf();

        let mut s = ChatSession::new(Arc::new(MockGateway::new()), &config);
        let greeting = s.greet();

        assert!(greeting.contains("Available data files:"));
        assert!(greeting.contains("  - inventory.xlsx"));
        assert!(greeting.contains("  - sales.xlsx"));
        assert!(greeting.ends_with("How would you like to analyze the data?"));
        assert_eq!(s.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_greet_with_missing_data_dir() {
        let mut config = ParleyConfig::default();
        config.agent.data_dir = "/nonexistent/data".into();

        let mut s = ChatSession::new(Arc::new(MockGateway::new()), &config);
        let greeting = s.greet();
        assert!(greeting.contains("Available data files:"));
    }

    #[tokio::test]
    async fn test_clear_history_resets_budget() {
        let gateway = MockGateway::new().with_text_turn("hi");
        let mut s = session(gateway);

        s.submit("hello", false).await.unwrap();
        // check_continue=false turns do not count against the budget
        assert_eq!(s.current_turn(), 0);
        assert_eq!(s.transcript().len(), 2);

        s.clear_history();
        assert!(s.transcript().is_empty());
        assert_eq!(s.current_turn(), 0);
    }

    #[tokio::test]
    async fn test_session_budget_exhaustion() {
        let gateway = MockGateway::new()
            .with_text_turn("step one")
            .with_text_turn(r#"{"reasoning": "more", "next_speaker": "model"}"#)
            .with_text_turn("step two")
            .with_text_turn(r#"{"reasoning": "more", "next_speaker": "model"}"#)
            .with_text_turn("step three");
        let mut config = ParleyConfig::default();
        config.agent.max_session_turns = 3;
        let mut s = ChatSession::new(Arc::new(gateway), &config);

        let o = s.submit("go", true).await.unwrap();
        assert!(o.should_continue);
        let o = s.submit_continue().await.unwrap();
        assert!(o.should_continue);

        let o = s.submit_continue().await.unwrap();
        assert!(!o.should_continue);
        assert_eq!(
            o.decision.unwrap().reasoning,
            "Maximum session turns reached"
        );
    }
}
