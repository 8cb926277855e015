//! Error types for the record model.

use thiserror::Error;

/// Result type alias for record operations.
pub type Result<T> = std::result::Result<T, RecordError>;

/// Errors that can occur while building or merging records.
#[derive(Error, Debug)]
pub enum RecordError {
    /// A pull-request number could not be parsed.
    #[error("invalid pull-request number: {0:?}")]
    InvalidPrNumber(String),

    /// Two records with disagreeing keys were handed to the merger.
    ///
    /// Merging is keyed on `(pr_number, repo)`; callers group records
    /// before merging, so a mismatch here is a precondition violation
    /// and never resolved by picking one side.
    #[error("merge key mismatch: {existing} vs {incoming}")]
    KeyMismatch { existing: String, incoming: String },

    /// A corpus contained two records with the same key.
    #[error("duplicate record key: {0}")]
    DuplicateKey(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
