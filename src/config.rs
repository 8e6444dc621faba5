//! TOML configuration for the CLI and collaborator endpoints.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunker::ChunkingConfig;
use crate::embedding::EmbeddingConfig;
use crate::error::{RagError, Result};
use crate::generation::GenerationConfig;

/// Top-level configuration.
///
/// ```toml
/// data_dir = "/var/lib/docqa"
/// chunk_size = 500
/// overlap = 100
///
/// [embedding]
/// provider = "ollama"
/// model = "all-minilm"
/// dimensions = 384
///
/// [generation]
/// model = "llama3.1:8b"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Where document artifacts live. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap: Option<usize>,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl RagConfig {
    /// Parses a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| RagError::Config(format!("invalid config file: {}", e)))
    }

    /// Loads a config file, or the defaults if the path does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Chunking parameters, validated.
    pub fn chunking(&self) -> Result<ChunkingConfig> {
        let defaults = ChunkingConfig::default();
        ChunkingConfig::new(
            self.chunk_size.unwrap_or(defaults.chunk_size),
            self.overlap.unwrap_or(defaults.overlap),
        )
    }
}
