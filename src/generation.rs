//! Answer-generation collaborator contract and Ollama client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{RagError, Result};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Opaque text-in, text-out generation service. The pipeline performs
/// no fallback when this fails; the error reaches the caller as-is.
pub trait Generator {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Configuration for the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Chat model identifier.
    pub model: String,
    /// Base URL of the Ollama server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "llama3.1:8b".to_string(),
            base_url: None,
        }
    }
}

/// Generator speaking Ollama's `/api/chat`.
pub struct OllamaGenerator {
    config: GenerationConfig,
    client: reqwest::blocking::Client,
}

impl OllamaGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RagError::Upstream(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OLLAMA_URL);
        format!("{}/api/chat", base.trim_end_matches('/'))
    }
}

impl Generator for OllamaGenerator {
    fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });

        log::debug!("requesting completion from {}", self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .map_err(|e| RagError::Upstream(format!("generation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(RagError::Upstream(format!(
                "generation endpoint returned {}: {}",
                status, detail
            )));
        }

        let value: Value = response
            .json()
            .map_err(|e| RagError::Upstream(format!("malformed generation response: {}", e)))?;
        parse_chat_response(&value)
    }
}

/// Ollama `/api/chat` (non-streaming) responds with
/// `{"message": {"role": "assistant", "content": "..."}}`.
fn parse_chat_response(value: &Value) -> Result<String> {
    value
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            RagError::Upstream("generation response has no message content".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_response() {
        let value = serde_json::json!({
            "message": {"role": "assistant", "content": "Grass is green."}
        });
        assert_eq!(parse_chat_response(&value).unwrap(), "Grass is green.");
    }

    #[test]
    fn missing_content_is_upstream_error() {
        let value = serde_json::json!({"done": true});
        assert!(matches!(
            parse_chat_response(&value),
            Err(RagError::Upstream(_))
        ));
    }
}
