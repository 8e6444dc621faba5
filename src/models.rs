//! Data models shared across the ingestion and retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounded span of document text with position metadata. The atomic
/// unit of retrieval; immutable once emitted by the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Document this segment belongs to.
    pub document_id: Uuid,
    /// 1-based source page number.
    pub page_number: u32,
    /// 0-based counter, unique within a document and monotonically
    /// increasing in emission order. This is the index slot the
    /// segment's vector occupies, so it is load-bearing.
    pub sequence_id: u32,
    /// The segment text.
    pub text: String,
}

/// Per-document summary written alongside the index and segment
/// artifacts at publish time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentManifest {
    pub document_id: Uuid,
    /// Caller-supplied source label (filename, URL), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    pub page_count: usize,
    pub segment_count: usize,
    /// Embedding dimensionality used for this document.
    pub dimensions: usize,
    /// Identifier of the embedding model that produced the vectors.
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
}

/// What the caller gets back from a successful ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub document_id: Uuid,
    pub page_count: usize,
    pub segment_count: usize,
}

/// A retrieved segment with its raw distance to the query vector.
/// Smaller distance means more similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSegment {
    pub segment: Segment,
    pub distance: f32,
}

/// Public query surface request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub document_id: Uuid,
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    2
}

impl QueryRequest {
    pub fn new(document_id: Uuid, query: impl Into<String>) -> Self {
        Self {
            document_id,
            query: query.into(),
            top_k: default_top_k(),
        }
    }
}

/// Public query surface response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub document_id: Uuid,
    pub query: String,
    pub answer: String,
    /// Ranked segments the answer was grounded on, best match first.
    pub retrieved_chunks: Vec<Segment>,
}
