//! Metadata extraction from raw notification text.
//!
//! The extractor turns one already-decoded notification (subject + body)
//! into a partial [`Record`]: PR number, repository, tickets, commit
//! lines, modified files, contributor mentions, markdown structure, and
//! tags. Partial records are folded into canonical ones by the merger.
//!
//! Extraction tolerates the noisy, inconsistent structure of GitHub
//! notification formats: every pattern is optional and a notification
//! that matches nothing still yields a valid (keyless) record.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

use crate::error::Result;
use crate::markdown;
use crate::record::Record;
use crate::tags::{RuleTagClassifier, TagClassify};

/// One decoded notification message, ready for extraction.
///
/// Mailbox decoding and HTML-to-text cleanup happen upstream; this layer
/// only sees plain text.
#[derive(Debug, Clone)]
pub struct RawNotification {
    /// The subject line.
    pub subject: String,

    /// The plain-text body.
    pub body: String,
}

impl RawNotification {
    /// Create a notification from subject and body text.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

// PR references in subjects and bodies: "PR #8040", "pull request #8040".
static PR_REF: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(?:PR|pull request)\s*#?\s*(\d+)").ok());

// Bare "#8040" references, used on subjects only where they are unambiguous.
static PR_BARE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"#(\d+)").ok());

// Repository names in square brackets: "[fuzzycert/fuzzycert_codecops]".
static REPO_BRACKET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[([\w.-]+/[\w.-]+)\]").ok());

// Repository names in GitHub URLs.
static REPO_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"github\.com/([\w.-]+/[\w.-]+)").ok());

// Ticket identifiers such as "FIZZY-2044".
static TICKET: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b([A-Z]+-\d+)\b").ok());

// Commit lines: an optional bullet, a 7-40 char sha, an optional message.
static COMMIT_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[-*]?[ \t]*([0-9a-f]{7,40})\b[ \t]*[-:]?[ \t]*(.*)$").ok()
});

// File paths from git-style change summaries: "M src/core/index.py".
static FILE_STATUS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:M|A|D|R\d{1,3})[ \t]+(?:a/|b/)?([\w./+-]+)").ok());

// File paths from prose-style summaries: "modified: src/app.js".
static FILE_CHANGED: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?im)(?:modified|added|removed|deleted|renamed|changed):[ \t]*([\w./-]+)").ok()
});

// Contributor mentions.
static MENTION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"@([A-Za-z0-9-]+)").ok());

/// Extracts partial records from raw notifications.
pub struct NotificationExtractor {
    classifier: Box<dyn TagClassify>,
}

impl NotificationExtractor {
    /// Create an extractor with the given tag classifier.
    pub fn new(classifier: Box<dyn TagClassify>) -> Self {
        Self { classifier }
    }

    /// Create an extractor with the rule-based classifier.
    pub fn with_defaults() -> Self {
        Self::new(Box::new(RuleTagClassifier::new()))
    }

    /// Extract a partial record from one notification.
    pub fn extract(&self, raw: &RawNotification) -> Result<Record> {
        let mut record = Record::new();

        self.extract_identity(raw, &mut record);

        let commit_messages = extract_commits(&raw.body, &mut record);
        let file_paths = extract_files(&raw.body, &mut record);
        extract_tickets(&raw.subject, &raw.body, &mut record);
        extract_mentions(&raw.body, &mut record);

        record.markdown = markdown::extract(&raw.body);
        record.push_body_excerpt(&raw.body);

        self.apply_tags(&mut record, &commit_messages, &file_paths);

        debug!(
            "Extracted record {} ({} commits, {} file tokens)",
            record.label(),
            record.commits.len(),
            record.files.len()
        );
        Ok(record)
    }

    /// Pull PR number, repository, and title out of subject and body.
    fn extract_identity(&self, raw: &RawNotification, record: &mut Record) {
        if let Some(re) = REPO_BRACKET.as_ref() {
            if let Some(caps) = re.captures(&raw.subject) {
                record.repo = caps.get(1).map(|m| m.as_str().to_string());
            }
        }
        if record.repo.is_none() {
            if let Some(re) = REPO_URL.as_ref() {
                if let Some(caps) = re.captures(&raw.body) {
                    record.repo = caps.get(1).map(|m| m.as_str().to_string());
                }
            }
        }

        let pr_text = find_pr_number(&raw.subject).or_else(|| find_pr_number(&raw.body));
        if let Some(text) = pr_text {
            if record.set_pr_number(&text).is_err() {
                debug!("Ignoring unparseable PR number: {text}");
            }
        }

        record.set_title(&clean_title(&raw.subject));
    }

    /// Derive tags from the four independent sources and union them.
    ///
    /// File rules run on the full paths, before tokenization, so that
    /// directory patterns like `/auth/` can still match.
    fn apply_tags(&self, record: &mut Record, commit_messages: &[String], file_paths: &[String]) {
        if let Some(title) = record.title.clone() {
            record.tags.extend(self.classifier.classify(&title));
        }
        if !commit_messages.is_empty() {
            let joined = commit_messages.join("\n");
            record.tags.extend(self.classifier.classify(&joined));
        }
        for path in file_paths {
            record.tags.extend(self.classifier.classify_path(path));
        }
        if !record.markdown.headings.is_empty() {
            let joined = record.markdown.headings.join("\n");
            record.tags.extend(self.classifier.classify(&joined));
        }
    }
}

/// Find the first PR number reference in `text`.
fn find_pr_number(text: &str) -> Option<String> {
    if let Some(re) = PR_REF.as_ref() {
        if let Some(caps) = re.captures(text) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }
    }
    // Bare "#123" is only trusted on short subject-like text, where it
    // cannot be an issue comment reference buried in prose.
    if !text.contains('\n') {
        if let Some(re) = PR_BARE.as_ref() {
            if let Some(caps) = re.captures(text) {
                return caps.get(1).map(|m| m.as_str().to_string());
            }
        }
    }
    None
}

/// Extract commit lines, storing prefixes on the record and returning the
/// commit messages for tag derivation.
fn extract_commits(body: &str, record: &mut Record) -> Vec<String> {
    let mut messages = Vec::new();
    if let Some(re) = COMMIT_LINE.as_ref() {
        for caps in re.captures_iter(body) {
            if let Some(sha) = caps.get(1) {
                record.push_commit(sha.as_str());
            }
            if let Some(msg) = caps.get(2) {
                let msg = msg.as_str().trim();
                if !msg.is_empty() {
                    messages.push(msg.to_string());
                }
            }
        }
    }
    messages
}

/// Extract modified file paths from both summary styles, storing their
/// components on the record and returning the full paths for tagging.
fn extract_files(body: &str, record: &mut Record) -> Vec<String> {
    let mut paths = Vec::new();
    for re in [FILE_STATUS.as_ref(), FILE_CHANGED.as_ref()].into_iter().flatten() {
        for caps in re.captures_iter(body) {
            if let Some(path) = caps.get(1) {
                record.push_file_path(path.as_str());
                paths.push(path.as_str().to_string());
            }
        }
    }
    paths
}

/// Extract ticket identifiers from subject and body.
fn extract_tickets(subject: &str, body: &str, record: &mut Record) {
    if let Some(re) = TICKET.as_ref() {
        for text in [subject, body] {
            for caps in re.captures_iter(text) {
                if let Some(ticket) = caps.get(1) {
                    record.tickets.insert(ticket.as_str().to_string());
                }
            }
        }
    }
}

/// Extract contributor mentions from the body.
fn extract_mentions(body: &str, record: &mut Record) {
    if let Some(re) = MENTION.as_ref() {
        for caps in re.captures_iter(body) {
            if let Some(name) = caps.get(1) {
                record.contributors.insert(name.as_str().to_string());
            }
        }
    }
}

/// Strip list prefixes, bracketed repo names, and trailing PR references
/// from a subject line to recover the bare title.
fn clean_title(subject: &str) -> String {
    let mut title = subject.trim();

    for prefix in ["Re:", "RE:", "Fwd:", "FWD:"] {
        if let Some(rest) = title.strip_prefix(prefix) {
            title = rest.trim_start();
        }
    }

    let mut owned = title.to_string();
    if let Some(re) = REPO_BRACKET.as_ref() {
        owned = re.replace_all(&owned, "").to_string();
    }
    if let Some(re) = PR_REF.as_ref() {
        owned = re.replace_all(&owned, "").to_string();
    }

    owned
        .trim()
        .trim_end_matches(['(', ')', '-', ':'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> NotificationExtractor {
        NotificationExtractor::with_defaults()
    }

    const BODY: &str = "\
@ada-lovelace requested review on PR #8040.

Commit Summary
- 3f2a9bc1d fix crash when session token expires
- 77eaab2 optimize token cache lookup

File Changes
M src/auth/session.rs
A tests/session_expiry.rs

Fixes FIZZY-2044. See https://github.com/fuzzycert/fuzzycert_codecops for details.
";

    #[test]
    fn test_extracts_identity_from_subject() {
        let raw = RawNotification::new(
            "[fuzzycert/fuzzycert_codecops] Fix session expiry crash (PR #8040)",
            BODY,
        );
        let record = extractor().extract(&raw).unwrap();

        assert_eq!(record.pr_number, Some(8040));
        assert_eq!(record.repo, Some("fuzzycert/fuzzycert_codecops".to_string()));
        assert_eq!(record.title, Some("Fix session expiry crash".to_string()));
    }

    #[test]
    fn test_extracts_commits_with_prefixes() {
        let raw = RawNotification::new("subject", BODY);
        let record = extractor().extract(&raw).unwrap();

        assert_eq!(
            record.commits,
            vec!["3f2a9bc".to_string(), "77eaab2".to_string()]
        );
    }

    #[test]
    fn test_extracts_files_as_path_tokens() {
        let raw = RawNotification::new("subject", BODY);
        let record = extractor().extract(&raw).unwrap();

        assert!(record.files.contains("src"));
        assert!(record.files.contains("auth"));
        assert!(record.files.contains("session.rs"));
        assert!(record.files.contains("session_expiry.rs"));
    }

    #[test]
    fn test_extracts_tickets_and_mentions() {
        let raw = RawNotification::new("subject", BODY);
        let record = extractor().extract(&raw).unwrap();

        assert!(record.tickets.contains("FIZZY-2044"));
        assert!(record.contributors.contains("ada-lovelace"));
    }

    #[test]
    fn test_tags_unioned_from_sources() {
        let raw = RawNotification::new(
            "[fuzzycert/fuzzycert_codecops] Fix session expiry crash (PR #8040)",
            BODY,
        );
        let record = extractor().extract(&raw).unwrap();

        // "Fix"/"crash" from the title, auth path from file rules,
        // "optimize" from commit messages.
        assert!(record.tags.contains("bug"));
        assert!(record.tags.contains("security"));
        assert!(record.tags.contains("performance"));
    }

    #[test]
    fn test_keyless_notification_is_still_a_record() {
        let raw = RawNotification::new("Weekly digest", "Nothing structured here.");
        let record = extractor().extract(&raw).unwrap();

        assert_eq!(record.pr_number, None);
        assert!(record.key().is_none());
        assert_eq!(record.title, Some("Weekly digest".to_string()));
    }

    #[test]
    fn test_prose_style_file_summary() {
        let raw = RawNotification::new("s", "changed: lib/parser.py\nmodified: lib/ast.py\n");
        let record = extractor().extract(&raw).unwrap();

        assert!(record.files.contains("parser.py"));
        assert!(record.files.contains("ast.py"));
    }
}
