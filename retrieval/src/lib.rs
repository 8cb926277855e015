//! # Retrieval Engine
//!
//! The query engine over pull-request notification records. It combines:
//!
//! - **Records**: the canonical corpus and layered scoring
//!   (`prmail-records`)
//! - **Embeddings**: vector similarity retrieval (`prmail-embeddings`)
//! - **Generation**: local language-model answer synthesis
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       PrSearchEngine                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   query ──► QueryMode dispatch                                  │
//! │                │                                                │
//! │      ┌─────────┼──────────────┐                                 │
//! │      ▼         ▼              ▼                                 │
//! │   commit     PR filter     semantic (augment ──► vector         │
//! │   scan                     search ──► rerank)                   │
//! │      └─────────┴──────────────┘                                 │
//! │                │                                                │
//! │                ▼                                                │
//! │        layered ranking ──► ContextBuilder ──► generation        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use prmail_retrieval::{PrSearchEngine, SearchConfig};
//!
//! let engine = PrSearchEngine::index_corpus(
//!     corpus,
//!     Box::new(OllamaEmbedder::new()),
//!     Box::new(OllamaGenerator::new()),
//!     SearchConfig::default(),
//! )
//! .await?;
//!
//! let answer = engine.answer("what changed in PR #8040?").await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod generate;
pub mod history;

pub use config::SearchConfig;
pub use engine::{EngineStats, PrSearchEngine, QueryAnswer, SearchHit, SearchOutcome};
pub use error::{QueryError, Result};
pub use generate::{
    GenerationProvider, GenerationRequest, GenerationResponse, OllamaGenerator, build_prompt,
};
pub use history::{ConversationHistory, Role, Turn};

// Re-export from dependencies for convenience
pub use prmail_embeddings::{EmbeddingProvider, OllamaEmbedder, SimilarityIndex};
pub use prmail_records::{Corpus, ParsedQuery, QueryMode, Record, Relevance};
