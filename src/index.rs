//! Append-only exact vector index with squared-L2 search.
//!
//! One index per document. Vectors are stored flat and searched by
//! brute force; documents are a few hundred segments at most, so an
//! exact scan is both the simplest and the fastest honest option.
//! Since stored vectors are unit-norm, squared Euclidean distance is a
//! strictly decreasing function of cosine similarity and ranks
//! identically.

use crate::error::{RagError, Result};

/// Artifact header: magic bytes plus a format version.
const MAGIC: &[u8; 4] = b"DQVI";
const FORMAT_VERSION: u8 = 1;

/// Append-only nearest-neighbor structure over one document's vectors.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    /// Dimensionality, fixed by the first `add`.
    dimensions: usize,
    /// Row-major storage, `len * dimensions` values.
    values: Vec<f32>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.values.len() / self.dimensions
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dimensionality, or 0 before the first `add`.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Appends vectors in order. The first call fixes the index
    /// dimensionality; every later vector must match it.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        // Validate the whole batch before touching storage so a failed
        // call leaves the index exactly as it was.
        let mut dimensions = self.dimensions;
        for vector in vectors {
            if vector.is_empty() {
                return Err(RagError::Config(
                    "cannot index a zero-dimension vector".to_string(),
                ));
            }
            if dimensions == 0 {
                dimensions = vector.len();
            } else if vector.len() != dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
        }

        self.dimensions = dimensions;
        for vector in vectors {
            self.values.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Returns up to `k` (slot, squared-L2 distance) pairs, ascending by
    /// distance with ties broken by lower slot id. Searching an empty
    /// index returns an empty vec; `k == 0` and a query of the wrong
    /// dimension are caller errors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if k == 0 {
            return Err(RagError::Config("k must be at least 1".to_string()));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .values
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(slot, row)| (slot, squared_l2(query, row)))
            .collect();

        // Ascending by distance, then by slot so result order is stable
        // run to run.
        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Serializes the index into its persisted artifact form:
    /// magic, version, u32 dimensions, u32 count, then f32 LE values.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(4 + 1 + 8 + self.values.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&(self.dimensions as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u32).to_le_bytes());
        for value in &self.values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Reloads a persisted index, validating the header and payload
    /// length. Anything short or inconsistent is a corrupt artifact.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 13 || bytes[0..4] != *MAGIC {
            return Err(RagError::Corruption(
                "vector index artifact has a bad header".to_string(),
            ));
        }
        if bytes[4] != FORMAT_VERSION {
            return Err(RagError::Corruption(format!(
                "unsupported vector index format version {}",
                bytes[4]
            )));
        }

        let dimensions = u32::from_le_bytes(bytes[5..9].try_into().unwrap()) as usize;
        let count = u32::from_le_bytes(bytes[9..13].try_into().unwrap()) as usize;
        let payload = &bytes[13..];

        let expected_len = dimensions
            .checked_mul(count)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                RagError::Corruption("vector index header overflows".to_string())
            })?;
        if payload.len() != expected_len {
            return Err(RagError::Corruption(format!(
                "vector index payload is {} bytes, expected {}",
                payload.len(),
                expected_len
            )));
        }

        let values = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Ok(Self { dimensions, values })
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
