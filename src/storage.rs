//! Persistence for per-document artifacts.
//!
//! One document owns three artifacts: a manifest, a segment sequence
//! (JSON), and a vector index (opaque binary blob). The store treats
//! the last two as blobs; only the manifest is interpreted here. The
//! retrieval core reaches storage through the [`ArtifactStore`] trait
//! so it stays storage-agnostic and testable with an in-memory fake.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

use crate::error::{RagError, Result};
use crate::models::DocumentManifest;

const MANIFEST_FILE: &str = "manifest.json";
const SEGMENTS_FILE: &str = "segments.json";
const INDEX_FILE: &str = "index.bin";

/// Everything persisted for one document.
#[derive(Debug, Clone)]
pub struct DocumentArtifacts {
    pub manifest: DocumentManifest,
    pub segments_json: String,
    pub index_bytes: Vec<u8>,
}

/// Storage seam for published documents.
///
/// `publish` is the single commit point of an ingestion: either all
/// three artifacts become visible together, or none do. Documents are
/// immutable after publish, so loads never race a write.
pub trait ArtifactStore {
    /// Atomically publishes a fully-built document.
    fn publish(&self, artifacts: &DocumentArtifacts) -> Result<()>;

    /// Loads all artifacts for a document, or `DocumentNotFound`.
    fn load(&self, document_id: Uuid) -> Result<DocumentArtifacts>;

    /// Whether the document has been published.
    fn contains(&self, document_id: Uuid) -> bool;

    /// Manifests of every published document, newest first.
    fn list(&self) -> Result<Vec<DocumentManifest>>;
}

/// Filesystem-backed store: `<base>/documents/<uuid>/` holds the three
/// artifact files. Publication stages the directory under
/// `<base>/staging/` and renames it into place, so readers never
/// observe a partially written document.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Default data directory for the local platform.
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("docqa"))
            .ok_or_else(|| RagError::Config("no local data directory available".to_string()))
    }

    /// Creates the storage tree.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.documents_dir())?;
        fs::create_dir_all(self.staging_dir())?;
        Ok(())
    }

    fn documents_dir(&self) -> PathBuf {
        self.base_path.join("documents")
    }

    fn staging_dir(&self) -> PathBuf {
        self.base_path.join("staging")
    }

    fn document_dir(&self, document_id: Uuid) -> PathBuf {
        self.documents_dir().join(document_id.to_string())
    }

    fn write_artifacts(dir: &Path, artifacts: &DocumentArtifacts) -> Result<()> {
        fs::create_dir_all(dir)?;
        let manifest_json = serde_json::to_string_pretty(&artifacts.manifest)?;
        fs::write(dir.join(MANIFEST_FILE), manifest_json)?;
        fs::write(dir.join(SEGMENTS_FILE), &artifacts.segments_json)?;
        fs::write(dir.join(INDEX_FILE), &artifacts.index_bytes)?;
        Ok(())
    }

    fn remove_stage(staging: &Path) {
        if let Err(e) = fs::remove_dir_all(staging) {
            log::warn!("failed to clean up staging dir {:?}: {}", staging, e);
        }
    }
}

/// A document with no persisted index or segment sequence is a missing
/// document, not a raw IO failure. Every other IO error passes through.
fn missing_artifact_error(error: std::io::Error, document_id: Uuid) -> RagError {
    if error.kind() == std::io::ErrorKind::NotFound {
        RagError::DocumentNotFound(document_id)
    } else {
        RagError::Io(error)
    }
}

impl ArtifactStore for FileStore {
    fn publish(&self, artifacts: &DocumentArtifacts) -> Result<()> {
        let document_id = artifacts.manifest.document_id;
        let final_dir = self.document_dir(document_id);
        if final_dir.exists() {
            return Err(RagError::Config(format!(
                "document {} is already published",
                document_id
            )));
        }

        let staging = self.staging_dir().join(document_id.to_string());
        if let Err(e) = Self::write_artifacts(&staging, artifacts) {
            // Abort: remove the partial stage so nothing of this
            // document id remains observable.
            Self::remove_stage(&staging);
            return Err(e);
        }

        // The commit point. rename within one filesystem is atomic, so
        // queries either see the whole document or none of it.
        if let Err(e) = fs::rename(&staging, &final_dir) {
            Self::remove_stage(&staging);
            return Err(e.into());
        }

        log::info!(
            "published document {} ({} segments)",
            document_id,
            artifacts.manifest.segment_count
        );
        Ok(())
    }

    fn load(&self, document_id: Uuid) -> Result<DocumentArtifacts> {
        let dir = self.document_dir(document_id);
        if !dir.exists() {
            return Err(RagError::DocumentNotFound(document_id));
        }

        let manifest_json = fs::read_to_string(dir.join(MANIFEST_FILE))
            .map_err(|e| missing_artifact_error(e, document_id))?;
        let manifest: DocumentManifest =
            serde_json::from_str(&manifest_json).map_err(|e| {
                RagError::Corruption(format!(
                    "manifest for {} failed to parse: {}",
                    document_id, e
                ))
            })?;
        let segments_json = fs::read_to_string(dir.join(SEGMENTS_FILE))
            .map_err(|e| missing_artifact_error(e, document_id))?;
        let index_bytes = fs::read(dir.join(INDEX_FILE))
            .map_err(|e| missing_artifact_error(e, document_id))?;

        Ok(DocumentArtifacts {
            manifest,
            segments_json,
            index_bytes,
        })
    }

    fn contains(&self, document_id: Uuid) -> bool {
        self.document_dir(document_id).exists()
    }

    fn list(&self) -> Result<Vec<DocumentManifest>> {
        let documents_dir = self.documents_dir();
        if !documents_dir.exists() {
            return Ok(Vec::new());
        }

        let mut manifests = Vec::new();
        for entry in fs::read_dir(&documents_dir)? {
            let entry = entry?;
            let manifest_path = entry.path().join(MANIFEST_FILE);
            if !manifest_path.exists() {
                continue;
            }
            let content = fs::read_to_string(&manifest_path)?;
            match serde_json::from_str::<DocumentManifest>(&content) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => {
                    log::warn!("skipping unreadable manifest {:?}: {}", manifest_path, e)
                }
            }
        }

        manifests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(manifests)
    }
}

/// In-memory store for tests and embedded use.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<Uuid, DocumentArtifacts>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, DocumentArtifacts>>> {
        self.documents
            .lock()
            .map_err(|e| RagError::Corruption(format!("memory store lock poisoned: {}", e)))
    }
}

impl ArtifactStore for MemoryStore {
    fn publish(&self, artifacts: &DocumentArtifacts) -> Result<()> {
        let mut documents = self.documents()?;
        let document_id = artifacts.manifest.document_id;
        if documents.contains_key(&document_id) {
            return Err(RagError::Config(format!(
                "document {} is already published",
                document_id
            )));
        }
        documents.insert(document_id, artifacts.clone());
        Ok(())
    }

    fn load(&self, document_id: Uuid) -> Result<DocumentArtifacts> {
        self.documents()?
            .get(&document_id)
            .cloned()
            .ok_or(RagError::DocumentNotFound(document_id))
    }

    fn contains(&self, document_id: Uuid) -> bool {
        self.documents()
            .map(|d| d.contains_key(&document_id))
            .unwrap_or(false)
    }

    fn list(&self) -> Result<Vec<DocumentManifest>> {
        let mut manifests: Vec<DocumentManifest> =
            self.documents()?.values().map(|a| a.manifest.clone()).collect();
        manifests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(manifests)
    }
}
