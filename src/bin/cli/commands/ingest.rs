use std::fs;
use std::path::Path;

use anyhow::Context;

use docqa::ChunkingConfig;

use crate::app::App;

/// Ingest a UTF-8 text file. Form feed characters separate pages, so a
/// single-page file needs no markers at all.
pub fn run(
    app: &App,
    file: &Path,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
) -> anyhow::Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read {:?}", file))?;
    let pages: Vec<String> = text.split('\u{c}').map(|p| p.to_string()).collect();

    let defaults = app.config.chunking()?;
    let chunking = ChunkingConfig::new(
        chunk_size.unwrap_or(defaults.chunk_size),
        overlap.unwrap_or(defaults.overlap),
    )?;

    let source_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());

    let receipt = app
        .pipeline
        .ingest(&pages, source_name.as_deref(), &chunking)?;

    println!("document_id: {}", receipt.document_id);
    println!("pages:       {}", receipt.page_count);
    println!("segments:    {}", receipt.segment_count);
    Ok(())
}
