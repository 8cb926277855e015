//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value in [-1.0, 1.0]; zero-magnitude inputs score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (mag_a * mag_b))
}

/// Normalize an embedding to unit length in place.
pub fn normalize(embedding: &mut Embedding) {
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in embedding.iter_mut() {
            *x /= magnitude;
        }
    }
}

/// A similarity search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Document id of the matched entry.
    pub id: String,

    /// Cosine similarity to the query vector.
    pub score: f32,
}

/// Find the top-k most similar candidates to `query`.
///
/// Results are sorted by descending score; equal scores break on
/// ascending id so output never depends on candidate iteration order.
pub fn find_top_k<'a>(
    query: &Embedding,
    candidates: impl Iterator<Item = (&'a str, &'a Embedding)>,
    k: usize,
    min_score: f32,
) -> Result<Vec<SimilarityResult>> {
    let mut scored: Vec<(OrderedFloat<f32>, &str)> = Vec::new();

    for (id, embedding) in candidates {
        let score = cosine_similarity(query, embedding)?;
        if score >= min_score {
            scored.push((OrderedFloat(score), id));
        }
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    Ok(scored
        .into_iter()
        .take(k)
        .map(|(score, id)| SimilarityResult {
            id: id.to_string(),
            score: score.0,
        })
        .collect())
}
