use uuid::Uuid;

use crate::app::App;

/// Print the top-k segments for a query, best match first.
pub fn run(app: &App, document_id: Uuid, query: &str, top_k: usize) -> anyhow::Result<()> {
    let results = app.pipeline.retrieve(document_id, query, top_k)?;

    if results.is_empty() {
        println!("no segments retrieved");
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        println!(
            "#{} (page {}, segment {}, distance {:.4})",
            rank + 1,
            result.segment.page_number,
            result.segment.sequence_id,
            result.distance
        );
        println!("{}", result.segment.text);
        println!();
    }
    Ok(())
}
