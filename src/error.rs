//! Crate-wide error type for the retrieval pipeline.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid caller-supplied parameters (chunking config, top_k, ...).
    /// Never retried.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The referenced document was never ingested or its artifacts are
    /// missing. Surfaced as a request-level failure with no partial result.
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Persisted artifacts failed to deserialize or are mutually
    /// inconsistent. Fatal for that document.
    #[error("Corrupt artifact: {0}")]
    Corruption(String),

    /// The embedding or generation collaborator failed. Propagated as-is;
    /// callers decide retry policy.
    #[error("Upstream collaborator failed: {0}")]
    Upstream(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Slot {slot} out of range (store has {len} entries)")]
    SlotOutOfRange { slot: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, RagError>;
