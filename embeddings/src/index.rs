//! The vector similarity index.
//!
//! Entries are keyed by document id (corpus position for prmail) and
//! stored in a `BTreeMap`, so search output is deterministic regardless
//! of insertion history. The index is exact cosine top-k; approximate
//! graph indexes trade recall for speed behind the same search contract
//! and their tuning knobs are not part of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::{SimilarityResult, find_top_k, normalize};

/// A similarity index over document embeddings.
pub struct SimilarityIndex {
    entries: BTreeMap<String, Embedding>,
    dimension: usize,
}

impl SimilarityIndex {
    /// Create an empty index expecting vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            dimension,
        }
    }

    /// The expected vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add a document embedding; the vector is normalized on insert.
    pub fn add(&mut self, id: impl Into<String>, mut embedding: Embedding) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        normalize(&mut embedding);
        let id = id.into();
        debug!("Indexed embedding for document {id}");
        self.entries.insert(id, embedding);
        Ok(())
    }

    /// Whether an id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Search for the `k` nearest documents with similarity >= `min_score`.
    pub fn search(
        &self,
        query: &Embedding,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SimilarityResult>> {
        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut query = query.clone();
        normalize(&mut query);

        find_top_k(
            &query,
            self.entries.iter().map(|(id, e)| (id.as_str(), e)),
            k,
            min_score,
        )
    }

    /// Serialize the index to JSON.
    pub fn to_json(&self) -> Result<String> {
        let stored = StoredIndex {
            dimension: self.dimension,
            entries: &self.entries,
        };
        Ok(serde_json::to_string(&stored)?)
    }

    /// Load an index from JSON written by [`SimilarityIndex::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: OwnedStoredIndex = serde_json::from_str(json)?;

        for (id, embedding) in &stored.entries {
            if embedding.len() != stored.dimension {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "stored embedding for {id} has dimension {}, index expects {}",
                    embedding.len(),
                    stored.dimension
                )));
            }
        }

        info!("Loaded similarity index with {} entries", stored.entries.len());
        Ok(Self {
            entries: stored.entries,
            dimension: stored.dimension,
        })
    }
}

#[derive(Serialize)]
struct StoredIndex<'a> {
    dimension: usize,
    entries: &'a BTreeMap<String, Embedding>,
}

#[derive(Deserialize)]
struct OwnedStoredIndex {
    dimension: usize,
    entries: BTreeMap<String, Embedding>,
}
