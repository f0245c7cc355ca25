use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use parley_core::{Part, Result, Role, Transcript, Turn};

use crate::gateway::{GenerationConfig, ModelGateway};

/// Google Gemini REST API gateway.
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiGateway {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn build_request_body(
        &self,
        transcript: &Transcript,
        config: &GenerationConfig,
    ) -> serde_json::Value {
        let mut contents = Vec::new();
        for turn in transcript.turns() {
            let role = match turn.role {
                Role::User => "user",
                Role::Model => "model",
                Role::FunctionResult => "function",
            };
            let parts: Vec<serde_json::Value> = turn.parts.iter().map(part_to_wire).collect();
            contents.push(serde_json::json!({
                "role": role,
                "parts": parts,
            }));
        }

        let mut generation_config = serde_json::json!({
            "temperature": config.temperature,
        });
        if let Some(cap) = config.max_output_tokens {
            generation_config["maxOutputTokens"] = serde_json::json!(cap);
        }
        if config.include_thoughts {
            generation_config["thinkingConfig"] = serde_json::json!({
                "includeThoughts": true,
            });
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": generation_config,
        });

        if let Some(ref system) = config.system_instruction {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system }],
            });
        }

        if !config.tools.is_empty() {
            let decls: Vec<serde_json::Value> = config
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    })
                })
                .collect();
            body["tools"] = serde_json::json!([{ "functionDeclarations": decls }]);
        }

        body
    }
}

/// Serialize one part into the Gemini wire format.
fn part_to_wire(part: &Part) -> serde_json::Value {
    match part {
        Part::Text { text } => serde_json::json!({ "text": text }),
        Part::Thought { text } => serde_json::json!({ "text": text, "thought": true }),
        Part::FunctionCall { name, args } => serde_json::json!({
            "functionCall": { "name": name, "args": args },
        }),
        Part::FunctionResult { name, response } => serde_json::json!({
            "functionResponse": { "name": name, "response": response },
        }),
    }
}

/// Parse one wire part into our model. Unknown part kinds are dropped.
fn part_from_wire(value: &serde_json::Value) -> Option<Part> {
    if let Some(fc) = value.get("functionCall") {
        return Some(Part::FunctionCall {
            name: fc["name"].as_str().unwrap_or("").to_string(),
            args: fc.get("args").cloned().unwrap_or(serde_json::Value::Null),
        });
    }
    if let Some(fr) = value.get("functionResponse") {
        return Some(Part::FunctionResult {
            name: fr["name"].as_str().unwrap_or("").to_string(),
            response: fr
                .get("response")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        });
    }
    if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
        if value.get("thought").and_then(|t| t.as_bool()).unwrap_or(false) {
            return Some(Part::Thought {
                text: text.to_string(),
            });
        }
        return Some(Part::Text {
            text: text.to_string(),
        });
    }
    None
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, transcript: &Transcript, config: &GenerationConfig) -> Result<Turn> {
        let body = self.build_request_body(transcript, config);
        debug!(model = %config.model, turns = transcript.len(), "sending Gemini API request");

        let resp = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, config.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| parley_core::ParleyError::Gateway(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(parley_core::ParleyError::RateLimited {
                    retry_after_secs: 30,
                });
            }
            return Err(parley_core::ParleyError::Gateway(format!(
                "HTTP {status}: {text}"
            )));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| parley_core::ParleyError::Gateway(e.to_string()))?;

        let wire_parts = data["candidates"][0]["content"]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        let parts: Vec<Part> = wire_parts.iter().filter_map(part_from_wire).collect();

        Ok(Turn::new(Role::Model, parts))
    }

    async fn health_check(&self) -> Result<()> {
        info!("checking Gemini API health");
        if self.api_key.is_empty() {
            return Err(parley_core::ParleyError::Gateway(
                "GEMINI_API_KEY not set".into(),
            ));
        }
        Ok(())
    }
}
