use crate::app::App;

/// List ingested documents, newest first.
pub fn run(app: &App) -> anyhow::Result<()> {
    let manifests = app.pipeline.store().list()?;

    if manifests.is_empty() {
        println!("no documents ingested");
        return Ok(());
    }

    for manifest in manifests {
        println!(
            "{}  {}  {} pages, {} segments, {} ({}d)",
            manifest.document_id,
            manifest.created_at.format("%Y-%m-%d %H:%M"),
            manifest.page_count,
            manifest.segment_count,
            manifest.embedding_model,
            manifest.dimensions
        );
        if let Some(source) = &manifest.source_name {
            println!("    source: {}", source);
        }
    }
    Ok(())
}
