//! Query parsing and retrieval-mode dispatch.
//!
//! [`ParsedQuery`] breaks a natural-language question into the exact
//! identifiers the scoring tiers match on. [`QueryMode`] is the 3-way
//! dispatcher: an explicit tagged enum, evaluated once per query, with
//! commit-hash detection checked before PR-number detection. Hex hashes
//! are a stronger, less ambiguous signal than a bare number, so commit
//! mode wins when both patterns are present.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::tags::TagClassify;

/// Commit-hash tokens must be at least this long to trigger commit mode.
pub const MIN_HASH_LEN: usize = 7;

/// And at most this long (a full SHA-1).
pub const MAX_HASH_LEN: usize = 40;

static PR_REF: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(?:PR|pull request)\s*#?\s*(\d+)").ok());

static TICKET: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b([A-Z]+-\d+)\b").ok());

/// Words carrying no matching signal, dropped from scoring tokens.
const STOP_WORDS: &[&str] = &[
    "a", "about", "all", "an", "and", "any", "are", "by", "can", "changed", "changes", "did",
    "do", "does", "for", "from", "happened", "has", "have", "how", "in", "is", "it", "me", "my",
    "of", "on", "or", "show", "tell", "that", "the", "this", "to", "was", "were", "what", "when",
    "where", "which", "who", "why", "with",
];

/// The retrieval path chosen for a query.
///
/// Each variant carries only the data its retrieval path needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// A commit hash (or prefix) was named; scan the corpus directly.
    Commit { hash: String },

    /// A PR number was named; filter on `pr_number` across repos.
    Pr { number: u32 },

    /// No exact identifier; retrieve by vector similarity.
    Semantic { text: String },
}

impl QueryMode {
    /// Classify a raw query string.
    pub fn detect(query: &str) -> Self {
        Self::from_parsed(&ParsedQuery::parse(query))
    }

    /// Classify an already-parsed query.
    ///
    /// Precedence: commit before PR, semantic as the default.
    pub fn from_parsed(parsed: &ParsedQuery) -> Self {
        if let Some(hash) = parsed.commit_hashes.first() {
            return Self::Commit { hash: hash.clone() };
        }
        if let Some(&number) = parsed.pr_numbers.first() {
            return Self::Pr { number };
        }
        Self::Semantic {
            text: parsed.raw.clone(),
        }
    }
}

/// A query broken into the identifiers the scoring tiers match on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// The original query text, used for reranking and display.
    pub raw: String,

    /// Lowercased content tokens with stop words removed.
    pub tokens: Vec<String>,

    /// PR numbers named with a "PR"/"pull request" keyword, mention order.
    pub pr_numbers: Vec<u32>,

    /// Hex tokens of plausible commit-hash length, mention order, lowercased.
    pub commit_hashes: Vec<String>,

    /// Ticket identifiers such as `FIZZY-2044`.
    pub tickets: BTreeSet<String>,

    /// Slash-containing tokens that may name a repository.
    pub repo_candidates: BTreeSet<String>,

    /// Individual components of any path-like token.
    pub path_tokens: BTreeSet<String>,

    /// Tags derived from the query text; populated by [`derive_tags`].
    ///
    /// [`derive_tags`]: ParsedQuery::derive_tags
    pub tags: BTreeSet<String>,
}

impl ParsedQuery {
    /// Parse a raw query string. Pure; tag derivation is a separate step
    /// so the classifier stays a passed-in capability.
    pub fn parse(raw: &str) -> Self {
        let mut parsed = Self {
            raw: raw.to_string(),
            ..Self::default()
        };

        for token in tokenize(raw) {
            let lowered = token.to_lowercase();

            if is_hash_token(&lowered) && !parsed.commit_hashes.contains(&lowered) {
                parsed.commit_hashes.push(lowered.clone());
            }

            if token.contains('/') {
                parsed.repo_candidates.insert(lowered.clone());
                for component in lowered.split('/') {
                    if !component.is_empty() {
                        parsed.path_tokens.insert(component.to_string());
                    }
                }
            }

            if lowered.len() >= 2 && !STOP_WORDS.contains(&lowered.as_str()) {
                parsed.tokens.push(lowered);
            }
        }

        if let Some(re) = PR_REF.as_ref() {
            for caps in re.captures_iter(raw) {
                if let Some(number) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
                    if !parsed.pr_numbers.contains(&number) {
                        parsed.pr_numbers.push(number);
                    }
                }
            }
        }

        if let Some(re) = TICKET.as_ref() {
            for caps in re.captures_iter(raw) {
                if let Some(ticket) = caps.get(1) {
                    parsed.tickets.insert(ticket.as_str().to_string());
                }
            }
        }

        parsed
    }

    /// Derive tags from the query text and any path-like tokens.
    pub fn derive_tags(&mut self, classifier: &dyn TagClassify) {
        self.tags.extend(classifier.classify(&self.raw));
        for candidate in &self.repo_candidates {
            self.tags.extend(classifier.classify_path(candidate));
        }
    }

    /// The query string augmented with extracted identifiers, used only
    /// to improve vector-search recall; reranking uses the original.
    pub fn augmented(&self) -> String {
        let mut extras: Vec<String> = Vec::new();
        extras.extend(self.tags.iter().cloned());
        extras.extend(self.repo_candidates.iter().cloned());
        extras.extend(self.tickets.iter().cloned());
        extras.extend(self.pr_numbers.iter().map(|n| format!("PR #{n}")));

        if extras.is_empty() {
            self.raw.clone()
        } else {
            format!("{}\n{}", self.raw, extras.join(" "))
        }
    }
}

/// Split text into tokens, keeping `.`, `-`, `_`, and `/` inside tokens
/// so filenames and repo names survive, then trimming stray punctuation
/// from the edges.
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '/')))
        .map(|t| t.trim_matches(|c: char| matches!(c, '.' | '-' | '_' | '/')))
        .filter(|t| !t.is_empty())
}

/// Whether a token reads as a commit hash: contiguous hex, 7-40 chars.
fn is_hash_token(token: &str) -> bool {
    (MIN_HASH_LEN..=MAX_HASH_LEN).contains(&token.len())
        && token.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::RuleTagClassifier;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_commit_mode_on_full_hash() {
        let mode = QueryMode::detect(
            "what shipped in 3f2a9bc1d4e5f60718293a4b5c6d7e8f90a1b2c3 for PR 8040?",
        );
        assert_eq!(
            mode,
            QueryMode::Commit {
                hash: "3f2a9bc1d4e5f60718293a4b5c6d7e8f90a1b2c3".to_string()
            }
        );
    }

    #[test]
    fn test_commit_mode_floor_is_seven_chars() {
        // Six hex chars is below the floor; falls through to semantic.
        let mode = QueryMode::detect("what changed in abc123?");
        assert!(matches!(mode, QueryMode::Semantic { .. }));

        let mode = QueryMode::detect("what changed in abc1234?");
        assert_eq!(
            mode,
            QueryMode::Commit {
                hash: "abc1234".to_string()
            }
        );
    }

    #[test]
    fn test_forty_one_hex_chars_is_not_a_hash() {
        let token = "a".repeat(41);
        let mode = QueryMode::detect(&format!("see {token}"));
        assert!(matches!(mode, QueryMode::Semantic { .. }));
    }

    #[test]
    fn test_pr_mode() {
        let mode = QueryMode::detect("PR #1234 commits and file changes");
        assert_eq!(mode, QueryMode::Pr { number: 1234 });

        let mode = QueryMode::detect("what happened in pull request 8040?");
        assert_eq!(mode, QueryMode::Pr { number: 8040 });
    }

    #[test]
    fn test_semantic_default() {
        let mode = QueryMode::detect("any security fixes to the login flow?");
        assert!(matches!(mode, QueryMode::Semantic { .. }));
    }

    #[test]
    fn test_parse_identifiers() {
        let parsed =
            ParsedQuery::parse("did FIZZY-2044 land in acme/widgets? see src/auth/session.rs");

        assert!(parsed.tickets.contains("FIZZY-2044"));
        assert!(parsed.repo_candidates.contains("acme/widgets"));
        assert!(parsed.path_tokens.contains("session.rs"));
        assert!(parsed.path_tokens.contains("auth"));
    }

    #[test]
    fn test_stop_words_dropped() {
        let parsed = ParsedQuery::parse("what changed in the login flow");
        assert_eq!(parsed.tokens, vec!["login".to_string(), "flow".to_string()]);
    }

    #[test]
    fn test_trailing_punctuation_trimmed_from_hash() {
        let parsed = ParsedQuery::parse("it was abc1234.");
        assert_eq!(parsed.commit_hashes, vec!["abc1234".to_string()]);
    }

    #[test]
    fn test_augmented_query_appends_identifiers() {
        let mut parsed = ParsedQuery::parse("sql fixes in acme/widgets for FIZZY-1");
        parsed.derive_tags(&RuleTagClassifier::new());

        let augmented = parsed.augmented();
        assert!(augmented.starts_with("sql fixes in acme/widgets for FIZZY-1"));
        assert!(augmented.contains("sql"));
        assert!(augmented.contains("FIZZY-1"));
        assert!(augmented.contains("acme/widgets"));
    }
}
