//! Markdown structure extraction from notification bodies.
//!
//! GitHub notification emails mix real markdown with plain-text section
//! titles ("Commit Summary", "File Changes", ...). Extraction walks the
//! body line by line and collects fenced code blocks, headings of both
//! flavors, and list items into a [`MarkdownContent`].

use crate::record::MarkdownContent;

/// Plain-text section titles that GitHub emails use in place of `#` headings.
const PLAIN_HEADINGS: &[&str] = &[
    "commit summary",
    "file changes",
    "what changed?",
    "what changed",
    "summary",
    "implementation details",
    "implementation",
    "testing notes",
    "changelog",
    "description",
];

/// Extract markdown structure from a notification body.
pub fn extract(text: &str) -> MarkdownContent {
    let mut content = MarkdownContent::default();

    let mut in_fence = false;
    let mut fence_lines: Vec<String> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim_end();

        if trimmed.trim_start().starts_with("```") {
            if in_fence {
                let block = fence_lines.join("\n").trim().to_string();
                if !block.is_empty() {
                    content.code_blocks.push(block);
                }
                fence_lines.clear();
            }
            in_fence = !in_fence;
            continue;
        }

        if in_fence {
            fence_lines.push(trimmed.to_string());
            continue;
        }

        if trimmed.trim().is_empty() {
            continue;
        }

        if let Some(heading) = markdown_heading(trimmed) {
            content.headings.push(heading);
            continue;
        }

        if let Some(heading) = plain_heading(trimmed) {
            content.headings.push(heading);
            continue;
        }

        if let Some(item) = list_item(trimmed) {
            content.list_items.push(item);
        }
    }

    // An unterminated fence still contributes its content.
    if in_fence {
        let block = fence_lines.join("\n").trim().to_string();
        if !block.is_empty() {
            content.code_blocks.push(block);
        }
    }

    content
}

/// Parse a `#`-style heading (1 to 6 hashes followed by a space).
fn markdown_heading(line: &str) -> Option<String> {
    let stripped = line.trim_start();
    let hashes = stripped.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &stripped[hashes..];
    let rest = rest.strip_prefix(' ')?;
    let heading = rest.trim();
    (!heading.is_empty()).then(|| heading.to_string())
}

/// Match a plain-text GitHub section title, tolerating a trailing
/// parenthesized qualifier such as "File Changes (3 files)".
fn plain_heading(line: &str) -> Option<String> {
    let mut candidate = line.trim();
    if let Some(open) = candidate.find('(') {
        if candidate.ends_with(')') {
            candidate = candidate[..open].trim_end();
        }
    }
    let lowered = candidate.to_lowercase();
    PLAIN_HEADINGS
        .iter()
        .any(|h| *h == lowered)
        .then(|| candidate.to_string())
}

/// Parse a bullet or numbered list line, returning the full trimmed line.
fn list_item(line: &str) -> Option<String> {
    let stripped = line.trim_start();

    let is_bullet = stripped.starts_with(['-', '*', '+']) && stripped[1..].starts_with(' ');

    let is_numbered = {
        let digits = stripped.chars().take_while(char::is_ascii_digit).count();
        digits > 0 && stripped[digits..].starts_with(". ")
    };

    (is_bullet || is_numbered).then(|| stripped.trim().to_string())
}
