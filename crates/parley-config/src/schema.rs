use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use parley_core::FunctionDecl;

/// Root configuration — maps to `parley.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub agent: AgentConfig,
    pub classifier: ClassifierConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub services: ServicesConfig,
}

// ── Agent ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Primary model identifier for the main, tool-enabled generation call.
    pub model: String,
    /// System prompt injected into every primary generation call.
    pub system_prompt: Option<String>,
    /// Path to a file containing the system prompt (overrides `system_prompt`).
    pub system_prompt_file: Option<PathBuf>,
    /// Sampling temperature for the primary call.
    pub temperature: f32,
    /// Maximum tokens per response. 0 = provider default.
    pub max_output_tokens: u32,
    /// Whether to request thought narration alongside the answer.
    pub include_thoughts: bool,
    /// Session turn budget: `advance` refuses continuation once this many
    /// controller invocations have happened. Non-positive = unlimited.
    pub max_session_turns: i64,
    /// Cap on consecutive automatic continuations per user input. Front-ends
    /// enforce this independently of the session turn budget.
    pub max_auto_continues: u32,
    /// Directory listed in the initial greeting.
    pub data_dir: PathBuf,
    /// Tool capabilities attached to the primary generation call.
    pub tools: Vec<FunctionDecl>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".into(),
            system_prompt: None,
            system_prompt_file: None,
            temperature: 0.1,
            max_output_tokens: 0,
            include_thoughts: true,
            max_session_turns: -1,
            max_auto_continues: 10,
            data_dir: PathBuf::from("data"),
            tools: vec![],
        }
    }
}

// ── Classifier ─────────────────────────────────────────────────

/// Configuration for the next-speaker classification side channel. Kept
/// separate from the primary call: low temperature, tight token cap, no tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Small/fast model used for the classification call.
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-lite".into(),
            temperature: 0.1,
            max_output_tokens: 200,
        }
    }
}

// ── Server ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. "127.0.0.1:8420".
    pub listen: String,
    /// Enable permissive CORS (for browser front-ends on other origins).
    pub cors: bool,
    /// Optional bearer token required on all /api routes.
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8420".into(),
            cors: true,
            api_key: None,
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
    /// Output format: "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Services ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Gemini API key. Falls back to the GEMINI_API_KEY env var.
    pub gemini_api_key: Option<String>,
    /// Override for the Gemini API base URL (testing, proxies).
    pub gemini_base_url: Option<String>,
}

impl ParleyConfig {
    /// Validate the config. Returns warnings for suspicious-but-workable
    /// settings; `Err` for settings that cannot work at all.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();

        if self.agent.model.trim().is_empty() {
            return Err("agent.model must not be empty".into());
        }
        if self.classifier.model.trim().is_empty() {
            return Err("classifier.model must not be empty".into());
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(format!(
                "agent.temperature must be in 0.0..=2.0, got {}",
                self.agent.temperature
            ));
        }
        if self.agent.max_auto_continues == 0 {
            warnings.push(
                "agent.max_auto_continues is 0, automatic continuation is disabled".into(),
            );
        }
        if self.classifier.max_output_tokens > 1024 {
            warnings.push(format!(
                "classifier.max_output_tokens is {}, the classifier only ever emits a small JSON object",
                self.classifier.max_output_tokens
            ));
        }
        if self.server.api_key.is_none() && !self.server.listen.starts_with("127.0.0.1") {
            warnings.push(format!(
                "server listens on {} without an API key",
                self.server.listen
            ));
        }

        Ok(warnings)
    }

    /// Resolve the effective system prompt: file > inline > built-in default.
    pub fn resolve_system_prompt(&self, default: &str) -> String {
        if let Some(ref path) = self.agent.system_prompt_file {
            if let Ok(contents) = std::fs::read_to_string(path) {
                return contents;
            }
            tracing::warn!(?path, "system_prompt_file unreadable, falling back");
        }
        self.agent
            .system_prompt
            .clone()
            .unwrap_or_else(|| default.to_string())
    }
}
