//! Error types for the query engine.

use thiserror::Error;

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors that can occur while answering a query.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Record model error.
    #[error("record error: {0}")]
    Record(#[from] prmail_records::RecordError),

    /// Embedding or vector index error.
    #[error("embedding error: {0}")]
    Embedding(#[from] prmail_embeddings::EmbeddingError),

    /// A filter or vector search produced no candidates.
    ///
    /// Recoverable: the caller reports "no matching … found" instead of
    /// falling through to an unrelated semantic answer.
    #[error("no matching {what} found")]
    NoMatches { what: String },

    /// The generation service failed or was unreachable.
    #[error("generation unavailable: {0}")]
    Generation(String),

    /// The vector index returned an id the corpus does not know.
    #[error("unknown document id in index: {0}")]
    UnknownDocumentId(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
