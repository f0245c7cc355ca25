use async_trait::async_trait;

use parley_core::{FunctionDecl, Result, Transcript, Turn};

/// Configuration for a single generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    /// Model identifier, e.g. "gemini-2.5-flash".
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token cap. `None` = provider default.
    pub max_output_tokens: Option<u32>,
    /// System instruction, separate from the transcript.
    pub system_instruction: Option<String>,
    /// Tool capabilities the model may request. Empty for pure classification
    /// calls, which must never trigger function calls.
    pub tools: Vec<FunctionDecl>,
    /// Whether to request thought narration alongside the answer.
    pub include_thoughts: bool,
}

impl GenerationConfig {
    /// Config for the main, tool-enabled conversation call.
    pub fn primary(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.1,
            include_thoughts: true,
            ..Default::default()
        }
    }

    /// Config for a low-temperature, token-capped, single-purpose side call.
    pub fn classifier(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.1,
            max_output_tokens: Some(200),
            include_thoughts: false,
            ..Default::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<FunctionDecl>) -> Self {
        self.tools = tools;
        self
    }
}

/// Trait implemented by each model backend (Gemini, mock, etc.)
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Human-readable backend name, e.g. "gemini".
    fn name(&self) -> &str;

    /// Generate one model turn from the transcript. Must return a
    /// distinguishable error on failure rather than a malformed success.
    async fn generate(&self, transcript: &Transcript, config: &GenerationConfig) -> Result<Turn>;

    /// Check that this gateway is usable (credentials present, reachable).
    async fn health_check(&self) -> Result<()>;
}
