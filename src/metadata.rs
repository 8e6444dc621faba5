//! Positional segment store paired 1:1 with a document's vector index.

use crate::error::{RagError, Result};
use crate::models::Segment;

/// Maps vector index slots back to the segments they embed. Appends
/// must happen in the same order as the paired index adds so slot i
/// always resolves to the segment with `sequence_id == i`.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    segments: Vec<Segment>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from an already-ordered segment sequence.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn append(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolves an index slot to its segment.
    pub fn lookup(&self, slot: usize) -> Result<&Segment> {
        self.segments.get(slot).ok_or(RagError::SlotOutOfRange {
            slot,
            len: self.segments.len(),
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Serializes the segment sequence into its JSON artifact form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.segments)?)
    }

    /// Reloads a persisted segment sequence. A parse failure means the
    /// artifact is corrupt, not that the document is missing.
    pub fn from_json(json: &str) -> Result<Self> {
        let segments: Vec<Segment> = serde_json::from_str(json).map_err(|e| {
            RagError::Corruption(format!("segment artifact failed to parse: {}", e))
        })?;
        Ok(Self { segments })
    }
}
