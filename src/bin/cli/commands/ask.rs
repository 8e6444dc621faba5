use anyhow::Context;
use uuid::Uuid;

use docqa::{OllamaGenerator, QueryRequest};

use crate::app::App;

/// Full question-answering round trip against one document.
pub fn run(app: &App, document_id: Uuid, query: &str, top_k: usize) -> anyhow::Result<()> {
    let generator = OllamaGenerator::new(app.config.generation.clone())
        .context("failed to build generation client")?;

    let request = QueryRequest {
        document_id,
        query: query.to_string(),
        top_k,
    };
    let response = app.pipeline.ask(&generator, &request)?;

    println!("{}", response.answer);
    println!();
    println!("grounded on {} segment(s):", response.retrieved_chunks.len());
    for chunk in &response.retrieved_chunks {
        println!(
            "  page {}, segment {}: {}",
            chunk.page_number,
            chunk.sequence_id,
            preview(&chunk.text)
        );
    }
    Ok(())
}

fn preview(text: &str) -> String {
    const MAX: usize = 80;
    let flattened = text.replace('\n', " ");
    if flattened.chars().count() <= MAX {
        flattened
    } else {
        let cut: String = flattened.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}
