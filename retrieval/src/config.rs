//! Configuration for the query engine.

use serde::{Deserialize, Serialize};

/// Configuration for retrieval and answer synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Candidate set size for semantic retrieval.
    pub top_k: usize,

    /// Minimum cosine similarity for a vector-search candidate.
    pub min_similarity: f32,

    /// Character budget for the assembled context.
    pub context_budget: usize,

    /// Per-record cap on the embedded body excerpt, in characters.
    pub excerpt_cap: usize,

    /// Embedding model override; `None` uses the provider default.
    pub embedding_model: Option<String>,

    /// Generation model override; `None` uses the provider default.
    pub generation_model: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.0,
            context_budget: 6000,
            excerpt_cap: 1500,
            embedding_model: None,
            generation_model: None,
        }
    }
}

impl SearchConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the semantic candidate set size.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum vector similarity.
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Set the context character budget.
    pub fn with_context_budget(mut self, budget: usize) -> Self {
        self.context_budget = budget;
        self
    }

    /// Set the per-record excerpt cap.
    pub fn with_excerpt_cap(mut self, cap: usize) -> Self {
        self.excerpt_cap = cap;
        self
    }

    /// Set the embedding model.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Set the generation model.
    pub fn with_generation_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model = Some(model.into());
        self
    }
}
