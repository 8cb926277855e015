//! Context assembly for answer synthesis.
//!
//! The builder turns the top-ranked records into the bounded text block
//! handed to the generation service. Admission is whole-block: a record
//! block that would push the output past the budget is omitted entirely,
//! and emission stops there so ranking order is never reordered around
//! the budget. Output is deterministic for identical inputs and never
//! exceeds the budget.

use crate::record::{Record, truncate_chars};

/// Default per-record cap on the embedded body excerpt, in characters.
pub const DEFAULT_EXCERPT_CAP: usize = 1500;

/// Assembles a size-bounded context from ranked records.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    excerpt_cap: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    /// Create a builder with the default excerpt cap.
    pub fn new() -> Self {
        Self {
            excerpt_cap: DEFAULT_EXCERPT_CAP,
        }
    }

    /// Set the per-record excerpt cap.
    pub fn with_excerpt_cap(mut self, cap: usize) -> Self {
        self.excerpt_cap = cap;
        self
    }

    /// Build a context string from records in ranking order, never
    /// exceeding `budget` characters.
    pub fn build(&self, records: &[&Record], budget: usize) -> String {
        let mut output = String::new();
        let mut used = 0usize;

        for (i, record) in records.iter().enumerate() {
            let block = self.render_block(record, i + 1);
            let block_chars = block.chars().count();

            if used + block_chars > budget {
                break;
            }
            output.push_str(&block);
            used += block_chars;
        }

        output
    }

    /// Render one record as a structured block.
    fn render_block(&self, record: &Record, ordinal: usize) -> String {
        let mut block = format!("--- RESULT {ordinal}: {} ---\n", record.label());

        if let Some(title) = &record.title {
            block.push_str(&format!("Title: {title}\n"));
        }
        if !record.tags.is_empty() {
            let tags: Vec<&str> = record.tags.iter().map(String::as_str).collect();
            block.push_str(&format!("Tags: {}\n", tags.join(", ")));
        }
        if !record.tickets.is_empty() {
            let tickets: Vec<&str> = record.tickets.iter().map(String::as_str).collect();
            block.push_str(&format!("Tickets: {}\n", tickets.join(", ")));
        }
        if !record.commits.is_empty() {
            block.push_str("Commits:\n");
            for commit in &record.commits {
                block.push_str(&format!("  - {commit}\n"));
            }
        }
        if !record.files.is_empty() {
            let files: Vec<&str> = record.files.iter().map(String::as_str).collect();
            block.push_str(&format!("Files: {}\n", files.join(", ")));
        }
        if !record.markdown.headings.is_empty() {
            block.push_str(&format!(
                "Sections: {}\n",
                record.markdown.headings.join(", ")
            ));
        }
        if !record.markdown.list_items.is_empty() {
            block.push_str("Notes:\n");
            for item in &record.markdown.list_items {
                block.push_str(&format!("  {item}\n"));
            }
        }
        for code in &record.markdown.code_blocks {
            block.push_str("Code:\n");
            block.push_str(code);
            block.push('\n');
        }
        if let Some(excerpt) = self.pick_excerpt(record) {
            block.push('\n');
            block.push_str(&excerpt);
            block.push('\n');
        }
        block.push('\n');

        block
    }

    /// The longest body excerpt, truncated to the per-record cap.
    fn pick_excerpt(&self, record: &Record) -> Option<String> {
        record
            .body_excerpts
            .iter()
            .max_by_key(|e| e.chars().count())
            .map(|e| truncate_chars(e, self.excerpt_cap))
    }
}
