//! Folding partial records into canonical ones.
//!
//! Several notifications usually describe the same pull request (opened,
//! review requested, new commits pushed, merged). The merger consolidates
//! them into one record per `(pr_number, repo)` key.
//!
//! Merge semantics: set-valued fields union; `commits` keeps first-seen
//! order with new entries appended; `title` is first-non-empty-wins;
//! markdown lists and body excerpts append entries not already present,
//! existing side first. With that policy merging a record with itself is
//! the identity, and merging is associative and commutative over the
//! set-valued fields.

use std::collections::HashMap;

use tracing::debug;

use crate::corpus::Corpus;
use crate::error::{RecordError, Result};
use crate::record::{Record, RecordKey, append_missing};

/// Merge an incoming partial record into an existing one.
///
/// `existing` and `incoming` must agree on `(pr_number, repo)`; callers
/// group records by key before merging, so disagreement is a fatal
/// precondition violation rather than something to re-derive here.
pub fn merge(existing: Option<Record>, incoming: Record) -> Result<Record> {
    let Some(mut merged) = existing else {
        return Ok(incoming);
    };

    if merged.key() != incoming.key() {
        return Err(RecordError::KeyMismatch {
            existing: merged.label(),
            incoming: incoming.label(),
        });
    }

    if merged.title.is_none() {
        merged.title = incoming.title;
    }

    merged.tickets.extend(incoming.tickets);
    merged.files.extend(incoming.files);
    merged.contributors.extend(incoming.contributors);
    merged.tags.extend(incoming.tags);

    append_missing(&mut merged.commits, &incoming.commits);
    append_missing(&mut merged.body_excerpts, &incoming.body_excerpts);
    merged.markdown.absorb(&incoming.markdown);

    Ok(merged)
}

/// Fold a sequence of partial records into a canonical corpus.
///
/// Records sharing a `(pr_number, repo)` key are merged in input order;
/// records without a `pr_number` bypass merging and become independent
/// corpus entries. Corpus order is the first-seen order of keys, which
/// keeps indexing deterministic for a given notification sequence.
pub fn fold(partials: impl IntoIterator<Item = Record>) -> Result<Corpus> {
    let mut keyed: Vec<(RecordKey, Record)> = Vec::new();
    let mut positions: HashMap<RecordKey, usize> = HashMap::new();
    let mut standalone: Vec<Record> = Vec::new();

    for partial in partials {
        match partial.key() {
            Some(key) => {
                if let Some(&idx) = positions.get(&key) {
                    let existing = std::mem::take(&mut keyed[idx].1);
                    keyed[idx].1 = merge(Some(existing), partial)?;
                } else {
                    positions.insert(key.clone(), keyed.len());
                    keyed.push((key, partial));
                }
            }
            None => standalone.push(partial),
        }
    }

    debug!(
        "Folded partial records into {} merged + {} standalone entries",
        keyed.len(),
        standalone.len()
    );

    let records = keyed
        .into_iter()
        .map(|(_, record)| record)
        .chain(standalone)
        .collect();
    Corpus::from_records(records)
}
