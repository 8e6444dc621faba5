//! HTTP-backed embedder for Ollama and OpenAI-compatible endpoints.

use std::time::Duration;

use serde_json::{json, Value};

use crate::error::{RagError, Result};

use super::{normalize, Embedder, EmbeddingConfig, EmbeddingProvider};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Embedder that sends texts to an external embedding service and
/// normalizes whatever comes back to unit L2 norm.
pub struct HttpEmbedder {
    config: EmbeddingConfig,
    client: reqwest::blocking::Client,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        if config.dimensions == 0 {
            return Err(RagError::Config(
                "embedding dimensions must be positive".to_string(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RagError::Upstream(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(match self.config.provider {
            EmbeddingProvider::Ollama => DEFAULT_OLLAMA_URL,
            EmbeddingProvider::OpenAi => DEFAULT_OPENAI_URL,
        });
        let path = match self.config.provider {
            EmbeddingProvider::Ollama => "/api/embed",
            EmbeddingProvider::OpenAi => "/v1/embeddings",
        };
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = json!({
            "model": self.config.model,
            "input": texts,
        });

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| RagError::Upstream(format!("embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(RagError::Upstream(format!(
                "embedding endpoint returned {}: {}",
                status, detail
            )));
        }

        let value: Value = response
            .json()
            .map_err(|e| RagError::Upstream(format!("malformed embedding response: {}", e)))?;

        match self.config.provider {
            EmbeddingProvider::Ollama => parse_ollama_response(&value),
            EmbeddingProvider::OpenAi => parse_openai_response(&value),
        }
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        log::debug!(
            "embedding {} texts with {} ({:?})",
            texts.len(),
            self.config.model,
            self.config.provider
        );

        let mut vectors = self.request_embeddings(texts)?;

        if vectors.len() != texts.len() {
            return Err(RagError::Upstream(format!(
                "embedding endpoint returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        for vector in &mut vectors {
            if vector.len() != self.config.dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: self.config.dimensions,
                    actual: vector.len(),
                });
            }
            normalize(vector);
        }

        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

/// Ollama `/api/embed` responds with `{"embeddings": [[...], ...]}`.
fn parse_ollama_response(value: &Value) -> Result<Vec<Vec<f32>>> {
    let rows = value
        .get("embeddings")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            RagError::Upstream("embedding response has no 'embeddings' array".to_string())
        })?;
    rows.iter().map(parse_vector).collect()
}

/// OpenAI-compatible `/v1/embeddings` responds with
/// `{"data": [{"index": i, "embedding": [...]}, ...]}`. Rows are sorted
/// by index so output order matches input order even if the endpoint
/// reorders them.
fn parse_openai_response(value: &Value) -> Result<Vec<Vec<f32>>> {
    let rows = value.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
        RagError::Upstream("embedding response has no 'data' array".to_string())
    })?;

    let mut indexed: Vec<(u64, Vec<f32>)> = Vec::with_capacity(rows.len());
    for row in rows {
        let index = row.get("index").and_then(|v| v.as_u64()).unwrap_or(indexed.len() as u64);
        let vector = row.get("embedding").ok_or_else(|| {
            RagError::Upstream("embedding row has no 'embedding' field".to_string())
        })?;
        indexed.push((index, parse_vector(vector)?));
    }
    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

fn parse_vector(value: &Value) -> Result<Vec<f32>> {
    let values = value.as_array().ok_or_else(|| {
        RagError::Upstream("embedding vector is not an array".to_string())
    })?;
    values
        .iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                RagError::Upstream("embedding vector holds a non-number".to_string())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ollama_shape() {
        let value = serde_json::json!({
            "model": "all-minilm",
            "embeddings": [[1.0, 0.0], [0.0, 1.0]],
        });
        let vectors = parse_ollama_response(&value).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn parses_openai_shape_and_restores_input_order() {
        let value = serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]},
            ],
        });
        let vectors = parse_openai_response(&value).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn missing_embeddings_field_is_upstream_error() {
        let value = serde_json::json!({"error": "model not found"});
        assert!(matches!(
            parse_ollama_response(&value),
            Err(RagError::Upstream(_))
        ));
        assert!(matches!(
            parse_openai_response(&value),
            Err(RagError::Upstream(_))
        ));
    }

    #[test]
    fn non_numeric_vector_is_upstream_error() {
        let value = serde_json::json!({"embeddings": [["a", "b"]]});
        assert!(matches!(
            parse_ollama_response(&value),
            Err(RagError::Upstream(_))
        ));
    }

    #[test]
    fn zero_dimension_config_is_rejected() {
        let config = EmbeddingConfig {
            dimensions: 0,
            ..EmbeddingConfig::default()
        };
        assert!(matches!(HttpEmbedder::new(config), Err(RagError::Config(_))));
    }
}
