//! Retrieval-augmented document question answering core.
//!
//! A document arrives as an ordered sequence of per-page strings, is
//! split into overlapping segments, embedded into unit-norm vectors,
//! and published as an immutable index + metadata pair. At query time
//! the question is embedded into the same space, the nearest segments
//! are retrieved, and their text grounds a prompt for an external
//! generation service.
//!
//! Text extraction (PDF and friends), the embedding model itself, and
//! the generator are external collaborators reached through small
//! traits; see [`embedding::Embedder`], [`generation::Generator`] and
//! [`storage::ArtifactStore`].

pub mod chunker;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use chunker::{chunk_pages, ChunkingConfig};
pub use config::RagConfig;
pub use embedding::{Embedder, EmbeddingConfig, HttpEmbedder};
pub use error::{RagError, Result};
pub use generation::{GenerationConfig, Generator, OllamaGenerator};
pub use index::VectorIndex;
pub use metadata::MetadataStore;
pub use models::{
    DocumentManifest, IngestReceipt, QueryRequest, QueryResponse, ScoredSegment, Segment,
};
pub use pipeline::Pipeline;
pub use storage::{ArtifactStore, DocumentArtifacts, FileStore, MemoryStore};
