//! Layered relevance scoring.
//!
//! Signals are grouped into priority tiers ordered so that any nonzero
//! match in a higher tier outranks every combination of lower-tier
//! matches: the one record actually about the queried PR can never be
//! statistically outranked by a record that happens to share many
//! low-value tokens. [`Relevance`] encodes the layering directly in its
//! ordering (per-tier match counts compared lexicographically, highest
//! tier first) instead of summing float weights.

use serde::{Deserialize, Serialize};

use crate::corpus::commit_prefix_matches;
use crate::query::ParsedQuery;
use crate::record::Record;

/// Number of scoring tiers.
pub const TIER_COUNT: usize = 8;

/// Per-tier counts are capped at this when projecting to a float, so
/// tiers cannot bleed into each other in the projection either.
const COMPOSITE_TIER_CAP: u32 = 999;

/// A layered relevance score.
///
/// Ordering is lexicographic over the tier counts, highest-priority tier
/// first; within a tier, more matching elements rank higher.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Relevance {
    tiers: [u32; TIER_COUNT],
}

impl Relevance {
    /// Tier 1: exact PR-number match.
    pub fn pr_number(&self) -> u32 {
        self.tiers[0]
    }

    /// Tier 2: commit-hash-prefix matches.
    pub fn commits(&self) -> u32 {
        self.tiers[1]
    }

    /// Tier 3: ticket-identifier matches.
    pub fn tickets(&self) -> u32 {
        self.tiers[2]
    }

    /// Tier 4: repository-name match.
    pub fn repo(&self) -> u32 {
        self.tiers[3]
    }

    /// Tier 5: file-path-component matches.
    pub fn files(&self) -> u32 {
        self.tiers[4]
    }

    /// Tier 6: tag overlap.
    pub fn tags(&self) -> u32 {
        self.tiers[5]
    }

    /// Tier 7: title token overlap.
    pub fn title(&self) -> u32 {
        self.tiers[6]
    }

    /// Tier 8: contributor matches.
    pub fn contributors(&self) -> u32 {
        self.tiers[7]
    }

    /// Whether no tier matched at all.
    pub fn is_zero(&self) -> bool {
        self.tiers.iter().all(|&c| c == 0)
    }

    /// Lossy float projection for display and telemetry.
    ///
    /// Per-tier counts are capped so a lower tier can never reach the
    /// next weight step; ordering decisions always use `Ord`, not this.
    pub fn composite(&self) -> f64 {
        self.tiers
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                let weight = 1000f64.powi((TIER_COUNT - 1 - i) as i32);
                f64::from(count.min(COMPOSITE_TIER_CAP)) * weight
            })
            .sum()
    }
}

/// Computes layered relevance scores for records against a parsed query.
///
/// Scoring is a pure function over immutable inputs; the engine holds no
/// state and the same `(record, query)` pair always produces the same
/// score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Create a scoring engine.
    pub fn new() -> Self {
        Self
    }

    /// Score one record against a parsed query.
    pub fn score(&self, record: &Record, query: &ParsedQuery) -> Relevance {
        let mut tiers = [0u32; TIER_COUNT];

        if let Some(pr) = record.pr_number {
            if query.pr_numbers.contains(&pr) {
                tiers[0] = 1;
            }
        }

        tiers[1] = count(record.commits.iter(), |commit| {
            query
                .commit_hashes
                .iter()
                .any(|token| commit_prefix_matches(commit, token))
        });

        tiers[2] = count(record.tickets.iter(), |ticket| {
            query
                .tickets
                .iter()
                .any(|t| t.eq_ignore_ascii_case(ticket))
        });

        if let Some(repo) = &record.repo {
            if query
                .repo_candidates
                .iter()
                .any(|c| c.eq_ignore_ascii_case(repo))
            {
                tiers[3] = 1;
            }
        }

        tiers[4] = count(record.files.iter(), |file| {
            query.tokens.iter().any(|t| t.eq_ignore_ascii_case(file))
                || query
                    .path_tokens
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(file))
        });

        tiers[5] = count(record.tags.iter(), |tag| query.tags.contains(tag.as_str()));

        if let Some(title) = &record.title {
            let title_lower = title.to_lowercase();
            let title_tokens: Vec<&str> = title_lower
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
                .collect();
            tiers[6] = count(query.tokens.iter(), |token| {
                title_tokens.iter().any(|t| *t == token.as_str())
            });
        }

        tiers[7] = count(record.contributors.iter(), |name| {
            query.tokens.iter().any(|t| t.eq_ignore_ascii_case(name))
        });

        Relevance { tiers }
    }

    /// Rank candidates by descending relevance.
    ///
    /// The sort is stable, so candidates with fully equal scores keep
    /// their input order. For vector-search results that is similarity
    /// order, which is exactly the tie-break the semantic path wants.
    pub fn rank<'a>(
        &self,
        candidates: Vec<(usize, &'a Record)>,
        query: &ParsedQuery,
    ) -> Vec<RankedRecord<'a>> {
        let mut ranked: Vec<RankedRecord<'a>> = candidates
            .into_iter()
            .map(|(position, record)| RankedRecord {
                position,
                record,
                relevance: self.score(record, query),
            })
            .collect();

        ranked.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        ranked
    }
}

/// A candidate record with its position and computed relevance.
#[derive(Debug, Clone)]
pub struct RankedRecord<'a> {
    /// Position in the corpus.
    pub position: usize,

    /// The record itself.
    pub record: &'a Record,

    /// Layered relevance against the query.
    pub relevance: Relevance,
}

fn count<T>(items: impl Iterator<Item = T>, matches: impl Fn(&T) -> bool) -> u32 {
    items.filter(|item| matches(item)).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pr: u32, repo: &str) -> Record {
        let mut r = Record::new();
        r.pr_number = Some(pr);
        r.repo = Some(repo.to_string());
        r
    }

    #[test]
    fn test_tier_one_dominates_all_lower_tiers() {
        let engine = ScoringEngine::new();

        // R1 only matches the PR number.
        let r1 = record(1234, "acme/widgets");

        // R2 piles up matches in tiers 6-8.
        let mut r2 = record(9999, "acme/widgets");
        r2.set_title("login flow security fixes everywhere");
        for tag in ["bug", "security", "ui", "api", "performance"] {
            r2.tags.insert(tag.to_string());
        }
        r2.contributors.insert("login".to_string());

        let mut query = ParsedQuery::parse("PR #1234 login flow security fixes everywhere");
        query.tags =
            ["bug", "security", "ui", "api", "performance"]
                .iter()
                .map(|s| s.to_string())
                .collect();

        let s1 = engine.score(&r1, &query);
        let s2 = engine.score(&r2, &query);

        assert_eq!(s1.pr_number(), 1);
        assert!(s2.pr_number() == 0 && s2.tags() == 5);
        assert!(s1 > s2);
    }

    #[test]
    fn test_more_matches_within_a_tier_rank_higher() {
        let engine = ScoringEngine::new();

        let mut one = record(1, "acme/widgets");
        one.tickets.insert("FIZZY-1".to_string());
        let mut two = record(2, "acme/widgets");
        two.tickets.insert("FIZZY-1".to_string());
        two.tickets.insert("FIZZY-2".to_string());

        let query = ParsedQuery::parse("status of FIZZY-1 and FIZZY-2");
        assert!(engine.score(&two, &query) > engine.score(&one, &query));
    }

    #[test]
    fn test_commit_prefix_comparison_uses_shorter_length() {
        let engine = ScoringEngine::new();

        let mut r = record(1, "acme/widgets");
        r.push_commit("3f2a9bc1d"); // stored as 7-char prefix

        let query = ParsedQuery::parse("what is 3f2a9bc1d4e5f60718293a4b5c6d7e8f90a1b2c3");
        assert_eq!(engine.score(&r, &query).commits(), 1);
    }

    #[test]
    fn test_file_token_match() {
        let engine = ScoringEngine::new();

        let mut r = record(1, "acme/widgets");
        r.push_file_path("src/utils/helpers.js");

        let query = ParsedQuery::parse("who touched helpers.js lately");
        assert_eq!(engine.score(&r, &query).files(), 1);

        let query = ParsedQuery::parse("anything under src/utils changed?");
        let score = engine.score(&r, &query);
        // Both "src" and "utils" components match.
        assert_eq!(score.files(), 2);
    }

    #[test]
    fn test_title_overlap_case_insensitive() {
        let engine = ScoringEngine::new();

        let mut r = record(1, "acme/widgets");
        r.set_title("Fix Login Crash");

        let query = ParsedQuery::parse("login crash details");
        assert_eq!(engine.score(&r, &query).title(), 2);
    }

    #[test]
    fn test_zero_score_for_unrelated_record() {
        let engine = ScoringEngine::new();
        let r = record(7, "acme/widgets");

        let query = ParsedQuery::parse("kubernetes ingress timeout");
        assert!(engine.score(&r, &query).is_zero());
    }

    #[test]
    fn test_rank_is_stable_for_equal_scores() {
        let engine = ScoringEngine::new();
        let a = record(1, "acme/widgets");
        let b = record(2, "acme/widgets");

        let query = ParsedQuery::parse("unrelated words entirely");
        let ranked = engine.rank(vec![(0, &a), (1, &b)], &query);

        assert_eq!(ranked[0].position, 0);
        assert_eq!(ranked[1].position, 1);
    }

    #[test]
    fn test_composite_projection_keeps_tier_order() {
        let engine = ScoringEngine::new();

        let r1 = record(1234, "acme/widgets");
        let mut r2 = record(9, "acme/widgets");
        r2.set_title("lots of words matching the query text here");

        let query = ParsedQuery::parse("PR #1234 lots of words matching the query text here");
        let s1 = engine.score(&r1, &query);
        let s2 = engine.score(&r2, &query);

        assert!(s1.composite() > s2.composite());
    }
}
