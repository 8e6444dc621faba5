//! Ingestion and retrieval orchestration.
//!
//! Ties the chunker, embedder, vector index, metadata store, and
//! artifact store together. Ingestion builds everything in memory and
//! publishes once; retrieval is a pure read over published artifacts.

use chrono::Utc;
use uuid::Uuid;

use crate::chunker::{chunk_pages, ChunkingConfig};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::generation::Generator;
use crate::index::VectorIndex;
use crate::metadata::MetadataStore;
use crate::models::{
    DocumentManifest, IngestReceipt, QueryRequest, QueryResponse, ScoredSegment,
};
use crate::storage::{ArtifactStore, DocumentArtifacts};

/// The retrieval pipeline. Holds no per-document state; every query
/// reloads the published artifacts, which are immutable.
pub struct Pipeline {
    store: Box<dyn ArtifactStore>,
    embedder: Box<dyn Embedder>,
}

impl Pipeline {
    pub fn new(store: Box<dyn ArtifactStore>, embedder: Box<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    /// Ingests one document: chunk, embed, index, publish.
    ///
    /// The document id is assigned here and never reused. Nothing is
    /// observable under that id until the final publish succeeds; any
    /// failure before it leaves no trace.
    pub fn ingest(
        &self,
        pages: &[String],
        source_name: Option<&str>,
        chunking: &ChunkingConfig,
    ) -> Result<IngestReceipt> {
        let document_id = Uuid::new_v4();
        let segments = chunk_pages(document_id, pages, chunking)?;

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let vectors = self.embedder.embed(&texts)?;
        if vectors.len() != segments.len() {
            return Err(RagError::Upstream(format!(
                "embedder returned {} vectors for {} segments",
                vectors.len(),
                segments.len()
            )));
        }

        // Index slots and metadata slots are filled in the same order,
        // establishing the 1:1 correspondence queries rely on.
        let mut index = VectorIndex::new();
        let mut metadata = MetadataStore::new();
        for (segment, vector) in segments.into_iter().zip(vectors.iter()) {
            index.add(std::slice::from_ref(vector))?;
            metadata.append(segment);
        }

        let manifest = DocumentManifest {
            document_id,
            source_name: source_name.map(|s| s.to_string()),
            page_count: pages.len(),
            segment_count: metadata.len(),
            dimensions: self.embedder.dimensions(),
            embedding_model: self.embedder.model_id().to_string(),
            created_at: Utc::now(),
        };

        let receipt = IngestReceipt {
            document_id,
            page_count: manifest.page_count,
            segment_count: manifest.segment_count,
        };

        self.store.publish(&DocumentArtifacts {
            manifest,
            segments_json: metadata.to_json()?,
            index_bytes: index.to_bytes(),
        })?;

        log::info!(
            "ingested document {}: {} pages, {} segments",
            receipt.document_id,
            receipt.page_count,
            receipt.segment_count
        );
        Ok(receipt)
    }

    /// Returns the top-k segments for a query against one document,
    /// best match first.
    pub fn retrieve(
        &self,
        document_id: Uuid,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredSegment>> {
        if k == 0 {
            return Err(RagError::Config("top_k must be at least 1".to_string()));
        }

        let (index, metadata) = self.load_document(document_id)?;

        let query_vectors = self.embedder.embed(&[query.to_string()])?;
        let query_vector = query_vectors.first().ok_or_else(|| {
            RagError::Upstream("embedder returned nothing for the query".to_string())
        })?;

        let hits = index.search(query_vector, k)?;

        let mut results = Vec::with_capacity(hits.len());
        for (slot, distance) in hits {
            // Guards against any transient slot/metadata mismatch; under
            // the publish invariant this never skips anything.
            if slot >= metadata.len() {
                log::warn!(
                    "search returned slot {} past metadata end {} for {}",
                    slot,
                    metadata.len(),
                    document_id
                );
                continue;
            }
            results.push(ScoredSegment {
                segment: metadata.lookup(slot)?.clone(),
                distance,
            });
        }

        Ok(results)
    }

    /// Full question-answering round trip: retrieve, assemble context,
    /// prompt the generator, return the answer with its grounding.
    pub fn ask(
        &self,
        generator: &dyn Generator,
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        let retrieved = self.retrieve(request.document_id, &request.query, request.top_k)?;

        let context = assemble_context(&retrieved);
        let prompt = build_prompt(&context, &request.query);
        let answer = generator.complete(&prompt)?;

        Ok(QueryResponse {
            document_id: request.document_id,
            query: request.query.clone(),
            answer,
            retrieved_chunks: retrieved.into_iter().map(|r| r.segment).collect(),
        })
    }

    fn load_document(&self, document_id: Uuid) -> Result<(VectorIndex, MetadataStore)> {
        let artifacts = self.store.load(document_id)?;

        let index = VectorIndex::from_bytes(&artifacts.index_bytes)?;
        let metadata = MetadataStore::from_json(&artifacts.segments_json)?;

        if index.len() != metadata.len() {
            return Err(RagError::Corruption(format!(
                "document {}: index has {} vectors but metadata has {} segments",
                document_id,
                index.len(),
                metadata.len()
            )));
        }
        if !index.is_empty() && index.dimensions() != artifacts.manifest.dimensions {
            return Err(RagError::Corruption(format!(
                "document {}: index dimension {} disagrees with manifest {}",
                document_id,
                index.dimensions(),
                artifacts.manifest.dimensions
            )));
        }

        Ok((index, metadata))
    }
}

/// Ordered concatenation of retrieved segment texts, best match first,
/// separated by a paragraph break.
pub fn assemble_context(results: &[ScoredSegment]) -> String {
    results
        .iter()
        .map(|r| r.segment.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Grounding prompt handed to the generation collaborator.
pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "Use ONLY the following context to answer the question.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Answer:",
        context, query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::normalize;
    use crate::storage::MemoryStore;

    /// Deterministic bag-of-words embedder: tokens are hashed into a
    /// fixed number of buckets and the counts normalized, so texts
    /// sharing words land close together. Embeds each text
    /// independently, which makes batch invariance trivial.
    struct StubEmbedder {
        dims: usize,
    }

    impl StubEmbedder {
        fn new() -> Self {
            // Wide enough that the test vocabulary does not collide.
            Self { dims: 256 }
        }

        fn embed_one(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0f32; self.dims];
            for token in text
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
            {
                let mut hash: u64 = 0xcbf29ce484222325;
                for byte in token.bytes() {
                    hash ^= byte as u64;
                    hash = hash.wrapping_mul(0x100000001b3);
                }
                vector[(hash % self.dims as u64) as usize] += 1.0;
            }
            normalize(&mut vector);
            vector
        }
    }

    impl Embedder for StubEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| self.embed_one(t)).collect())
        }

        fn dimensions(&self) -> usize {
            self.dims
        }

        fn model_id(&self) -> &str {
            "stub-bow"
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(RagError::Upstream("embedding service down".to_string()))
        }

        fn dimensions(&self) -> usize {
            256
        }

        fn model_id(&self) -> &str {
            "failing"
        }
    }

    struct CannedGenerator;

    impl Generator for CannedGenerator {
        fn complete(&self, prompt: &str) -> Result<String> {
            assert!(prompt.contains("Context:"));
            Ok("Green.".to_string())
        }
    }

    struct FailingGenerator;

    impl Generator for FailingGenerator {
        fn complete(&self, _prompt: &str) -> Result<String> {
            Err(RagError::Upstream("generation service down".to_string()))
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(Box::new(MemoryStore::new()), Box::new(StubEmbedder::new()))
    }

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn end_to_end_retrieval_finds_the_grass_segment() {
        let pipeline = pipeline();
        let chunking = ChunkingConfig::new(20, 4).unwrap();
        let receipt = pipeline
            .ingest(
                &pages(&["The sky is blue. Grass is green."]),
                Some("colors.txt"),
                &chunking,
            )
            .unwrap();
        assert_eq!(receipt.page_count, 1);
        assert!(receipt.segment_count >= 2);

        let results = pipeline
            .retrieve(receipt.document_id, "What color is grass?", 1)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].segment.text.contains("Grass is green"));
    }

    #[test]
    fn sixteen_char_windows_still_rank_the_grass_chunk_first() {
        let pipeline = pipeline();
        let chunking = ChunkingConfig::new(16, 4).unwrap();
        let receipt = pipeline
            .ingest(&pages(&["The sky is blue. Grass is green."]), None, &chunking)
            .unwrap();

        let results = pipeline
            .retrieve(receipt.document_id, "What color is grass?", 1)
            .unwrap();
        // A 16-char window cannot hold the whole sentence; the best
        // chunk is the one straddling it.
        assert!(results[0].segment.text.contains("Grass is"));
    }

    #[test]
    fn retrieval_preserves_rank_order_and_is_idempotent() {
        let pipeline = pipeline();
        let chunking = ChunkingConfig::new(30, 5).unwrap();
        let receipt = pipeline
            .ingest(
                &pages(&[
                    "Cats sleep all day long.",
                    "Dogs bark at the mail carrier.",
                    "Fish swim in the cold river.",
                ]),
                None,
                &chunking,
            )
            .unwrap();

        let first = pipeline
            .retrieve(receipt.document_id, "Where do fish swim?", 3)
            .unwrap();
        let second = pipeline
            .retrieve(receipt.document_id, "Where do fish swim?", 3)
            .unwrap();

        assert!(first[0].segment.text.contains("Fish"));
        for pair in first.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        let first_slots: Vec<u32> = first.iter().map(|r| r.segment.sequence_id).collect();
        let second_slots: Vec<u32> = second.iter().map(|r| r.segment.sequence_id).collect();
        assert_eq!(first_slots, second_slots);
    }

    #[test]
    fn unknown_document_is_not_found() {
        let pipeline = pipeline();
        let missing = Uuid::new_v4();
        assert!(matches!(
            pipeline.retrieve(missing, "anything", 2),
            Err(RagError::DocumentNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn zero_top_k_is_a_config_error() {
        let pipeline = pipeline();
        assert!(matches!(
            pipeline.retrieve(Uuid::new_v4(), "anything", 0),
            Err(RagError::Config(_))
        ));
    }

    #[test]
    fn blank_document_publishes_and_answers_empty() {
        let pipeline = pipeline();
        let receipt = pipeline
            .ingest(&pages(&["   ", ""]), None, &ChunkingConfig::default())
            .unwrap();
        assert_eq!(receipt.segment_count, 0);

        let results = pipeline
            .retrieve(receipt.document_id, "anything at all", 5)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn failed_ingestion_publishes_nothing() {
        let store = MemoryStore::new();
        let pipeline = Pipeline::new(Box::new(store), Box::new(FailingEmbedder));

        let err = pipeline
            .ingest(&pages(&["some text"]), None, &ChunkingConfig::default())
            .unwrap_err();
        assert!(matches!(err, RagError::Upstream(_)));
        assert!(pipeline.store().list().unwrap().is_empty());
    }

    #[test]
    fn misaligned_artifacts_are_corruption() {
        use crate::models::Segment;

        let store = MemoryStore::new();
        let embedder = StubEmbedder::new();
        let document_id = Uuid::new_v4();

        // Two indexed vectors but only one segment on record.
        let mut index = VectorIndex::new();
        index
            .add(&embedder.embed(&pages(&["one", "two"])).unwrap())
            .unwrap();
        let metadata = MetadataStore::from_segments(vec![Segment {
            document_id,
            page_number: 1,
            sequence_id: 0,
            text: "one".to_string(),
        }]);

        store
            .publish(&DocumentArtifacts {
                manifest: DocumentManifest {
                    document_id,
                    source_name: None,
                    page_count: 1,
                    segment_count: 1,
                    dimensions: embedder.dimensions(),
                    embedding_model: "stub-bow".to_string(),
                    created_at: Utc::now(),
                },
                segments_json: metadata.to_json().unwrap(),
                index_bytes: index.to_bytes(),
            })
            .unwrap();

        let pipeline = Pipeline::new(Box::new(store), Box::new(embedder));
        assert!(matches!(
            pipeline.retrieve(document_id, "one", 1),
            Err(RagError::Corruption(_))
        ));
    }

    #[test]
    fn ask_grounds_the_answer_in_retrieved_chunks() {
        let pipeline = pipeline();
        let chunking = ChunkingConfig::new(20, 4).unwrap();
        let receipt = pipeline
            .ingest(&pages(&["The sky is blue. Grass is green."]), None, &chunking)
            .unwrap();

        let request = QueryRequest::new(receipt.document_id, "What color is grass?");
        let response = pipeline.ask(&CannedGenerator, &request).unwrap();

        assert_eq!(response.answer, "Green.");
        assert_eq!(response.document_id, receipt.document_id);
        assert_eq!(response.retrieved_chunks.len(), 2);
        assert!(response
            .retrieved_chunks
            .iter()
            .any(|c| c.text.contains("Grass is green")));
    }

    #[test]
    fn generator_failure_propagates_with_no_fallback_answer() {
        let pipeline = pipeline();
        let receipt = pipeline
            .ingest(&pages(&["some text"]), None, &ChunkingConfig::default())
            .unwrap();

        let request = QueryRequest::new(receipt.document_id, "question");
        assert!(matches!(
            pipeline.ask(&FailingGenerator, &request),
            Err(RagError::Upstream(_))
        ));
    }

    #[test]
    fn context_assembly_joins_in_rank_order() {
        use crate::models::Segment;

        let results = vec![
            ScoredSegment {
                segment: Segment {
                    document_id: Uuid::nil(),
                    page_number: 1,
                    sequence_id: 1,
                    text: "best match".to_string(),
                },
                distance: 0.1,
            },
            ScoredSegment {
                segment: Segment {
                    document_id: Uuid::nil(),
                    page_number: 1,
                    sequence_id: 0,
                    text: "second match".to_string(),
                },
                distance: 0.4,
            },
        ];

        assert_eq!(assemble_context(&results), "best match\n\nsecond match");
    }

    #[test]
    fn stub_embeddings_are_batch_invariant() {
        let embedder = StubEmbedder::new();
        let texts = pages(&["alpha beta", "gamma delta", "epsilon"]);
        let batched = embedder.embed(&texts).unwrap();
        let single = embedder.embed(&pages(&["gamma delta"])).unwrap();
        assert_eq!(batched[1], single[0]);
    }
}
