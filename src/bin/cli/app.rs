use std::path::{Path, PathBuf};

use anyhow::Context;

use docqa::{FileStore, HttpEmbedder, Pipeline, RagConfig};

/// Shared CLI state: resolved config and a ready pipeline.
pub struct App {
    pub config: RagConfig,
    pub pipeline: Pipeline,
}

impl App {
    pub fn new(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let default_dir = FileStore::default_data_dir()
            .context("could not determine a data directory")?;

        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| default_dir.join("config.toml"));
        let config = RagConfig::load(&config_path)
            .with_context(|| format!("failed to load config {:?}", config_path))?;

        let base_dir = data_dir
            .or_else(|| config.data_dir.clone())
            .unwrap_or(default_dir);

        let store = FileStore::new(base_dir);
        store.init().context("failed to initialize storage")?;

        let embedder = HttpEmbedder::new(config.embedding.clone())
            .context("failed to build embedding client")?;

        Ok(Self {
            config,
            pipeline: Pipeline::new(Box::new(store), Box::new(embedder)),
        })
    }
}
