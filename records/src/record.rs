//! The canonical record model.
//!
//! A [`Record`] holds everything the engine knows about one pull request,
//! merged together from however many notification messages mentioned it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Result};

/// Commit hashes are stored as this many leading hex characters.
pub const COMMIT_PREFIX_LEN: usize = 7;

/// Body excerpts are truncated to this many characters before storage.
pub const EXCERPT_MAX_CHARS: usize = 2000;

/// The unique key of a merge-eligible record.
///
/// Records without a pull-request number have no key and are never merged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// The pull-request number.
    pub pr_number: u32,

    /// The repository the pull request belongs to, when known.
    pub repo: Option<String>,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repo {
            Some(repo) => write!(f, "{repo}#{}", self.pr_number),
            None => write!(f, "#{}", self.pr_number),
        }
    }
}

/// Structured markdown content pulled out of notification bodies.
///
/// The lists keep the order in which fragments were seen; merging appends
/// fragments from later notifications after the existing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownContent {
    /// Fenced code block contents.
    pub code_blocks: Vec<String>,

    /// Section headings, both `#`-style and plain GitHub section titles.
    pub headings: Vec<String>,

    /// Bullet and numbered list lines.
    pub list_items: Vec<String>,
}

impl MarkdownContent {
    /// Whether no markdown structure was found.
    pub fn is_empty(&self) -> bool {
        self.code_blocks.is_empty() && self.headings.is_empty() && self.list_items.is_empty()
    }

    /// Append fragments from `other` that are not already present,
    /// preserving their order.
    pub fn absorb(&mut self, other: &MarkdownContent) {
        append_missing(&mut self.code_blocks, &other.code_blocks);
        append_missing(&mut self.headings, &other.headings);
        append_missing(&mut self.list_items, &other.list_items);
    }
}

/// One pull request's worth of merged notification data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Pull-request number; key component. Records without one stand alone.
    pub pr_number: Option<u32>,

    /// Repository name; key component alongside `pr_number`.
    pub repo: Option<String>,

    /// Ticket identifiers such as `FIZZY-2044`.
    pub tickets: BTreeSet<String>,

    /// Commit-hash prefixes in first-seen order, duplicates removed.
    pub commits: Vec<String>,

    /// Path-component tokens of every modified file.
    pub files: BTreeSet<String>,

    /// Pull-request title; first non-empty value wins across merges.
    pub title: Option<String>,

    /// Contributor identifiers mentioned in notification bodies.
    pub contributors: BTreeSet<String>,

    /// Category tags from the fixed vocabulary.
    pub tags: BTreeSet<String>,

    /// Structured markdown content.
    pub markdown: MarkdownContent,

    /// Raw body fragments, each truncated before storage.
    pub body_excerpts: Vec<String>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// The merge key, when this record is merge-eligible.
    pub fn key(&self) -> Option<RecordKey> {
        self.pr_number.map(|pr_number| RecordKey {
            pr_number,
            repo: self.repo.clone(),
        })
    }

    /// Set the pull-request number from text, rejecting non-numeric input.
    pub fn set_pr_number(&mut self, text: &str) -> Result<()> {
        let trimmed = text.trim().trim_start_matches('#');
        let number: u32 = trimmed
            .parse()
            .map_err(|_| RecordError::InvalidPrNumber(text.to_string()))?;
        self.pr_number = Some(number);
        Ok(())
    }

    /// Set the title if none is present yet; empty input is ignored.
    pub fn set_title(&mut self, title: &str) {
        let trimmed = title.trim();
        if self.title.is_none() && !trimmed.is_empty() {
            self.title = Some(trimmed.to_string());
        }
    }

    /// Record a commit hash, normalized to its lowercase 7-character prefix.
    ///
    /// Insertion order is preserved and duplicates are skipped.
    pub fn push_commit(&mut self, sha: &str) {
        let prefix: String = sha
            .trim()
            .chars()
            .take(COMMIT_PREFIX_LEN)
            .collect::<String>()
            .to_lowercase();
        if prefix.is_empty() {
            return;
        }
        if !self.commits.contains(&prefix) {
            self.commits.push(prefix);
        }
    }

    /// Record a modified file path, splitting it into its components so
    /// queries can match at any path granularity.
    pub fn push_file_path(&mut self, path: &str) {
        for component in path.split('/') {
            let component = component.trim();
            if !component.is_empty() {
                self.files.insert(component.to_string());
            }
        }
    }

    /// Record a body fragment, truncated to the storage cap.
    pub fn push_body_excerpt(&mut self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let excerpt = truncate_chars(trimmed, EXCERPT_MAX_CHARS);
        if !self.body_excerpts.contains(&excerpt) {
            self.body_excerpts.push(excerpt);
        }
    }

    /// The text handed to the embedding provider during indexing.
    ///
    /// Structured metadata is appended after the free text so the vector
    /// representation carries commits, files, and tags alongside prose.
    pub fn indexable_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(title) = &self.title {
            parts.push(title.clone());
        }
        for excerpt in &self.body_excerpts {
            parts.push(excerpt.clone());
        }
        if let Some(repo) = &self.repo {
            parts.push(format!("Repo: {repo}"));
        }
        if let Some(pr) = self.pr_number {
            parts.push(format!("PR: #{pr}"));
        }
        if !self.commits.is_empty() {
            parts.push(format!("Commits: {}", self.commits.join(", ")));
        }
        if !self.tickets.is_empty() {
            parts.push(format!("Tickets: {}", join_set(&self.tickets)));
        }
        if !self.files.is_empty() {
            parts.push(format!("Files: {}", join_set(&self.files)));
        }
        if !self.tags.is_empty() {
            parts.push(format!("Tags: {}", join_set(&self.tags)));
        }
        if !self.markdown.headings.is_empty() {
            parts.push(format!("Sections: {}", self.markdown.headings.join(", ")));
        }

        parts.join("\n\n")
    }

    /// A short human-readable label for logs and disambiguation output.
    pub fn label(&self) -> String {
        match self.key() {
            Some(key) => key.to_string(),
            None => self
                .title
                .clone()
                .unwrap_or_else(|| "untitled notification".to_string()),
        }
    }
}

fn join_set(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Append entries from `incoming` that `target` does not already contain,
/// keeping their original order.
pub(crate) fn append_missing(target: &mut Vec<String>, incoming: &[String]) {
    for entry in incoming {
        if !target.contains(entry) {
            target.push(entry.clone());
        }
    }
}

/// Truncate `text` to at most `max_chars` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_path_tokenization() {
        let mut record = Record::new();
        record.push_file_path("src/utils/helpers.js");

        let expected: BTreeSet<String> = ["src", "utils", "helpers.js"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(record.files, expected);
    }

    #[test]
    fn test_commit_normalization() {
        let mut record = Record::new();
        record.push_commit("ABC1234DEF5678");
        record.push_commit("abc1234");

        assert_eq!(record.commits, vec!["abc1234".to_string()]);
    }

    #[test]
    fn test_pr_number_parse_rejects_garbage() {
        let mut record = Record::new();
        assert!(record.set_pr_number("#8040").is_ok());
        assert_eq!(record.pr_number, Some(8040));

        assert!(record.set_pr_number("forty").is_err());
    }

    #[test]
    fn test_title_first_nonempty_wins() {
        let mut record = Record::new();
        record.set_title("   ");
        assert_eq!(record.title, None);

        record.set_title("Fix login crash");
        record.set_title("A later title");
        assert_eq!(record.title, Some("Fix login crash".to_string()));
    }

    #[test]
    fn test_excerpt_truncation() {
        let mut record = Record::new();
        let long = "x".repeat(EXCERPT_MAX_CHARS * 2);
        record.push_body_excerpt(&long);

        assert_eq!(record.body_excerpts[0].chars().count(), EXCERPT_MAX_CHARS);
    }

    #[test]
    fn test_key_display() {
        let mut record = Record::new();
        record.set_pr_number("8040").unwrap();
        record.repo = Some("fuzzycert/fuzzycert_codecops".to_string());

        let key = record.key().unwrap();
        assert_eq!(key.to_string(), "fuzzycert/fuzzycert_codecops#8040");
    }

    #[test]
    fn test_keyless_record_has_no_key() {
        let mut record = Record::new();
        record.repo = Some("acme/widgets".to_string());
        assert!(record.key().is_none());
    }
}
