//! The canonical record collection.
//!
//! A [`Corpus`] is built once by the indexing phase and read-only at
//! query time. Record order is stable, so corpus positions double as
//! document ids for the parallel vector index.

use std::collections::HashMap;

use tracing::info;

use crate::error::{RecordError, Result};
use crate::record::{Record, RecordKey};

/// Compare a stored commit prefix against a query token, up to the
/// length of the shorter side.
pub fn commit_prefix_matches(stored: &str, token: &str) -> bool {
    let n = stored.len().min(token.len());
    if n == 0 {
        return false;
    }
    stored.is_char_boundary(n)
        && token.is_char_boundary(n)
        && stored[..n].eq_ignore_ascii_case(&token[..n])
}

/// An immutable collection of canonical records.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<Record>,
    by_key: HashMap<RecordKey, usize>,
}

impl Corpus {
    /// Build a corpus from canonical records, rejecting duplicate keys.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let mut by_key = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            if let Some(key) = record.key() {
                if by_key.insert(key.clone(), idx).is_some() {
                    return Err(RecordError::DuplicateKey(key.to_string()));
                }
            }
        }
        Ok(Self { records, by_key })
    }

    /// All records in corpus order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterate over `(position, record)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.records.iter().enumerate()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the corpus holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by corpus position.
    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    /// Look up a record by merge key.
    pub fn get_by_key(&self, key: &RecordKey) -> Option<&Record> {
        self.by_key.get(key).map(|&idx| &self.records[idx])
    }

    /// All records whose `pr_number` equals `number`, across repos.
    pub fn find_by_pr(&self, number: u32) -> Vec<(usize, &Record)> {
        self.iter()
            .filter(|(_, r)| r.pr_number == Some(number))
            .collect()
    }

    /// All records holding a commit that prefix-matches `token`.
    pub fn find_by_commit(&self, token: &str) -> Vec<(usize, &Record)> {
        self.iter()
            .filter(|(_, r)| r.commits.iter().any(|c| commit_prefix_matches(c, token)))
            .collect()
    }

    /// Serialize the corpus to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.records)?)
    }

    /// Load a corpus from JSON written by [`Corpus::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<Record> = serde_json::from_str(json)?;
        let corpus = Self::from_records(records)?;
        info!("Loaded corpus with {} records", corpus.len());
        Ok(corpus)
    }
}
