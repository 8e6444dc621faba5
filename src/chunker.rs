//! Deterministic sliding-window chunking of per-page text.

use uuid::Uuid;

use crate::error::{RagError, Result};
use crate::models::Segment;

/// Default window width, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive windows, in characters.
pub const DEFAULT_OVERLAP: usize = 100;

/// Window parameters for [`chunk_pages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Characters per segment.
    pub chunk_size: usize,
    /// Characters shared between consecutive segments of one page.
    /// Must be strictly smaller than `chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    /// Builds a validated config.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    /// Rejects parameter combinations that would make the window step
    /// zero or negative (non-terminating) or the window empty.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be positive".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Splits per-page text into fixed-width overlapping segments.
///
/// Pages are 1-based; each page is trimmed of surrounding whitespace
/// before windowing. Windows are measured in characters (not bytes)
/// and slide by `chunk_size - overlap`, starting at offset 0. The
/// `sequence_id` counter is shared across the whole document, in
/// emission order, because it doubles as the vector index slot.
///
/// A page that is empty after trimming yields no segments; a page
/// shorter than the window yields exactly one segment.
pub fn chunk_pages(
    document_id: Uuid,
    pages: &[String],
    config: &ChunkingConfig,
) -> Result<Vec<Segment>> {
    config.validate()?;

    let mut segments = Vec::new();
    let mut sequence_id: u32 = 0;

    for (page_index, page) in pages.iter().enumerate() {
        let page_number = (page_index + 1) as u32;
        let chars: Vec<char> = page.trim().chars().collect();

        let mut start = 0;
        while start < chars.len() {
            let end = (start + config.chunk_size).min(chars.len());
            let text: String = chars[start..end].iter().collect();

            segments.push(Segment {
                document_id,
                page_number,
                sequence_id,
                text,
            });

            sequence_id += 1;
            start += config.step();
        }
    }

    log::debug!(
        "chunked {} pages into {} segments (chunk_size={}, overlap={})",
        pages.len(),
        segments.len(),
        config.chunk_size,
        config.overlap
    );

    Ok(segments)
}
