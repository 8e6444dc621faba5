//! Embedding collaborator contract and configuration.

mod http;

pub use http::HttpEmbedder;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maps text to fixed-dimension unit-norm vectors.
///
/// Implementations must be deterministic for a fixed model version,
/// preserve input order element for element, and return exactly one
/// vector per input text. Batched and single-item calls over the same
/// text must agree within floating tolerance. The pipeline takes this
/// as an injected dependency so tests can substitute a stub.
pub trait Embedder {
    /// Embeds an ordered sequence of texts into an ordered sequence of
    /// vectors, position i of the output embedding position i of the
    /// input.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector dimensionality this embedder produces.
    fn dimensions(&self) -> usize;

    /// Identifier of the underlying model, recorded in document
    /// manifests.
    fn model_id(&self) -> &str;
}

/// Which HTTP API shape the embedding endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Ollama's native `/api/embed`.
    Ollama,
    /// An OpenAI-compatible `/v1/embeddings` endpoint.
    OpenAi,
}

/// Configuration for embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider API shape.
    pub provider: EmbeddingProvider,
    /// Model identifier (e.g. "all-minilm", "text-embedding-3-small").
    pub model: String,
    /// Dimensionality of the embedding vectors. Fixed for the lifetime
    /// of a deployment; mixing dimensions across documents is an
    /// invariant violation.
    pub dimensions: usize,
    /// Optional API key (OpenAI-compatible endpoints).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Optional base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Ollama,
            model: "all-minilm".to_string(),
            dimensions: 384,
            api_key: None,
            base_url: None,
        }
    }
}

/// Scales a vector to unit L2 norm in place. Applied to every provider
/// response so squared Euclidean ranking is cosine-equivalent no matter
/// what the endpoint returns. A zero vector is left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
