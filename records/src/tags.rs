//! Tag classification over a fixed category vocabulary.
//!
//! Tags are derived independently from four text sources per record
//! (title, commit messages, file-path tokens, markdown headings) and
//! unioned; any one signal is sufficient evidence of relevance.
//!
//! The shipped classifier is rule based. An embedding-backed classifier
//! can be dropped in behind the same [`TagClassify`] contract; any
//! implementation must break equal-similarity ties lexicographically on
//! tag name, which the `BTreeSet` return type encodes.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex_lite::Regex;

/// Contract for mapping free text to a subset of the tag vocabulary.
pub trait TagClassify: Send + Sync {
    /// Tags evidenced by a free-text string.
    fn classify(&self, text: &str) -> BTreeSet<String>;

    /// Tags evidenced by a modified file path.
    fn classify_path(&self, path: &str) -> BTreeSet<String>;
}

/// Keyword patterns per tag, applied to free text with word boundaries.
const KEYWORD_RULES: &[(&str, &[&str])] = &[
    (
        "bug",
        &[
            r"\bbug\b",
            r"\bfix(es|ed)?\b",
            r"\berror\b",
            r"\bissue\b",
            r"\bcrash\b",
            r"\bhotfix\b",
            r"\bregression\b",
        ],
    ),
    (
        "sql",
        &[
            r"\bsql\b",
            r"\btable\b",
            r"\bdatabase\b",
            r"\bdb\b",
            r"\bquery\b",
            r"\bmigrations?\b",
        ],
    ),
    (
        "ui",
        &[
            r"\bui\b",
            r"\bux\b",
            r"\bfrontend\b",
            r"\bbutton\b",
            r"\blayout\b",
            r"\bdesign\b",
            r"\bcss\b",
        ],
    ),
    (
        "api",
        &[r"\bapi\b", r"\bendpoints?\b", r"\brest\b", r"\bjson\b"],
    ),
    (
        "security",
        &[
            r"\bsecurity\b",
            r"\bxss\b",
            r"\bsql[\s_-]?injection\b",
            r"\bauth(entication|orization)?\b",
            r"\bcsrf\b",
            r"\botp\b",
            r"\bvulnerabilit(y|ies)\b",
        ],
    ),
    (
        "performance",
        &[
            r"\bperformance\b",
            r"\bspeed\b",
            r"\bfaster\b",
            r"\boptimi[sz](e|ing|ation)s?\b",
            r"\blatency\b",
            r"\bcach(e|ing)\b",
        ],
    ),
    (
        "test",
        &[r"\btests?\b", r"\btesting\b", r"\bci\b", r"\bcoverage\b"],
    ),
    (
        "docs",
        &[r"\bdocs?\b", r"\bdocumentation\b", r"\breadme\b"],
    ),
    (
        "dependency",
        &[r"\bdependenc(y|ies)\b", r"\bbump(s|ed)?\b", r"\bupgrade(s|d)?\b"],
    ),
    (
        "refactor",
        &[r"\brefactor(s|ing|ed)?\b", r"\bcleanup\b", r"\brename(s|d)?\b"],
    ),
    (
        "release",
        &[r"\brelease(s|d)?\b", r"\bversion\b", r"\bchangelog\b"],
    ),
    (
        "config",
        &[r"\bconfig(uration)?s?\b", r"\bsettings\b", r"\benv\b"],
    ),
    (
        "build",
        &[r"\bbuild(s)?\b", r"\bcompil(e|es|ation)\b", r"\bpipeline\b"],
    ),
];

/// Path substring patterns per tag, matched against lowercased paths.
const FILE_RULES: &[(&str, &[&str])] = &[
    (
        "ui",
        &[
            "/ui/",
            "/frontend/",
            "/components/",
            "/views/",
            "/templates/",
            ".css",
            ".scss",
            ".sass",
            ".less",
            ".jsx",
            ".tsx",
            ".vue",
            ".html",
        ],
    ),
    (
        "sql",
        &["/migrations/", "/migration/", "/db/", "/database/", ".sql"],
    ),
    (
        "api",
        &[
            "/api/",
            "/routes/",
            "/controllers/",
            "/endpoints/",
            "router",
            "controller",
        ],
    ),
    (
        "security",
        &[
            "/auth/",
            "/authentication/",
            "/authorization/",
            "/security/",
            "jwt",
            "oauth",
            "permissions",
        ],
    ),
    (
        "performance",
        &["cache", "caching", "/performance/", "indexing", "batch"],
    ),
    (
        "test",
        &["/tests/", "/test/", "_test.", ".spec.", "/ci/"],
    ),
    ("docs", &["/docs/", "/doc/", ".md", ".rst"]),
];

static COMPILED_KEYWORD_RULES: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    KEYWORD_RULES
        .iter()
        .map(|(tag, patterns)| {
            let compiled = patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect::<Vec<_>>();
            (*tag, compiled)
        })
        .collect()
});

/// Rule-based tag classifier over the fixed vocabulary.
#[derive(Debug, Clone, Default)]
pub struct RuleTagClassifier;

impl RuleTagClassifier {
    /// Create a new rule-based classifier.
    pub fn new() -> Self {
        Self
    }

    /// The full tag vocabulary this classifier can emit.
    pub fn vocabulary() -> BTreeSet<String> {
        KEYWORD_RULES
            .iter()
            .map(|(tag, _)| tag.to_string())
            .chain(FILE_RULES.iter().map(|(tag, _)| tag.to_string()))
            .collect()
    }
}

impl TagClassify for RuleTagClassifier {
    fn classify(&self, text: &str) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        if text.trim().is_empty() {
            return tags;
        }

        let lowered = text.to_lowercase();
        for (tag, patterns) in COMPILED_KEYWORD_RULES.iter() {
            if patterns.iter().any(|p| p.is_match(&lowered)) {
                tags.insert(tag.to_string());
            }
        }
        tags
    }

    fn classify_path(&self, path: &str) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        if path.trim().is_empty() {
            return tags;
        }

        let lowered = path.to_lowercase();
        for (tag, patterns) in FILE_RULES {
            if patterns.iter().any(|p| lowered.contains(p)) {
                tags.insert(tag.to_string());
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tags(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keyword_rules() {
        let classifier = RuleTagClassifier::new();

        assert_eq!(
            classifier.classify("Fix crash in login flow"),
            tags(&["bug"])
        );
        assert_eq!(
            classifier.classify("Optimize slow SQL query"),
            tags(&["performance", "sql"])
        );
    }

    #[test]
    fn test_word_boundaries() {
        let classifier = RuleTagClassifier::new();

        // "prefix" contains "fix" but not on a word boundary.
        assert!(classifier.classify("add prefix handling").is_empty());
    }

    #[test]
    fn test_file_rules() {
        let classifier = RuleTagClassifier::new();

        assert_eq!(
            classifier.classify_path("db/migrations/0042_add_index.sql"),
            tags(&["sql"])
        );
        assert_eq!(
            classifier.classify_path("web/components/LoginButton.tsx"),
            tags(&["ui"])
        );
    }

    #[test]
    fn test_empty_input() {
        let classifier = RuleTagClassifier::new();
        assert!(classifier.classify("   ").is_empty());
        assert!(classifier.classify_path("").is_empty());
    }

    #[test]
    fn test_vocabulary_is_sorted_and_deduplicated() {
        let vocab = RuleTagClassifier::vocabulary();
        assert!(vocab.contains("bug"));
        assert!(vocab.contains("ui"));
        // BTreeSet iteration is lexicographic by construction.
        let listed: Vec<_> = vocab.iter().cloned().collect();
        let mut sorted = listed.clone();
        sorted.sort();
        assert_eq!(listed, sorted);
    }
}
