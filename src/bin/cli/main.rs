mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "docqa", about = "Document question answering over local artifacts", version)]
struct Cli {
    /// Path to a TOML config file (default: <data dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the artifact data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a UTF-8 text file as a new document (form feed = page break)
    Ingest {
        /// File to ingest
        file: PathBuf,
        /// Override the window width in characters
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Override the window overlap in characters
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Retrieve the most similar segments for a query, without generation
    Retrieve {
        /// Document id returned at ingestion
        document_id: uuid::Uuid,
        /// The question or search text
        query: String,
        /// Number of segments to return
        #[arg(long, default_value = "2")]
        top_k: usize,
    },

    /// Ask a question and generate a grounded answer
    Ask {
        /// Document id returned at ingestion
        document_id: uuid::Uuid,
        /// The question
        query: String,
        /// Number of segments to ground the answer on
        #[arg(long, default_value = "2")]
        top_k: usize,
    },

    /// List ingested documents
    List,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = app::App::new(cli.config.as_deref(), cli.data_dir)?;

    match cli.command {
        Command::Ingest {
            file,
            chunk_size,
            overlap,
        } => commands::ingest::run(&app, &file, chunk_size, overlap),
        Command::Retrieve {
            document_id,
            query,
            top_k,
        } => commands::retrieve::run(&app, document_id, &query, top_k),
        Command::Ask {
            document_id,
            query,
            top_k,
        } => commands::ask::run(&app, document_id, &query, top_k),
        Command::List => commands::list::run(&app),
    }
}
