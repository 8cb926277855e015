//! # Embeddings
//!
//! Embedding generation and vector similarity search for prmail.
//!
//! - **Provider contract**: [`EmbeddingProvider`], with an Ollama-backed
//!   implementation for local models
//! - **Similarity index**: exact cosine top-k over document embeddings,
//!   deterministic output, JSON persistence
//! - **Cache**: avoids re-embedding unchanged records across index runs
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Embeddings System                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► SimilarityIndex            │
//! │       │                                   │                     │
//! │       ▼                                   ▼                     │
//! │  OllamaEmbedder + EmbeddingCache     top-k search               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod index;
pub mod provider;
pub mod similarity;

pub use cache::{CachedEmbedder, EmbeddingCache};
pub use error::{EmbeddingError, Result};
pub use index::SimilarityIndex;
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OllamaEmbedder};
pub use similarity::{SimilarityResult, cosine_similarity};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Default embedding dimension (all-minilm).
pub const DEFAULT_DIMENSION: usize = 384;
