//! # PR Notification Records
//!
//! This crate implements the record model and retrieval core for prmail:
//!
//! - **Records**: one canonical document per pull request, merged from
//!   however many notification messages mentioned it
//! - **Extraction**: PR numbers, repos, tickets, commits, files,
//!   mentions, and markdown structure from raw notification text
//! - **Tagging**: rule-based classification over a fixed vocabulary
//! - **Dispatch**: the 3-way commit / PR / semantic query classifier
//! - **Scoring**: layered relevance where higher tiers always dominate
//! - **Context**: size-bounded context assembly for answer synthesis
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Record Pipeline                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  RawNotification ──► NotificationExtractor ──► Record (partial) │
//! │                                                     │           │
//! │                       TagClassify ◄─────────────────┤           │
//! │                                                     ▼           │
//! │                    merge::fold ──► Corpus (canonical, one per   │
//! │                                    (pr_number, repo) key)       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                         Query Side                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  query text ──► ParsedQuery ──► QueryMode (commit | pr |        │
//! │                     │                       semantic)           │
//! │                     ▼                                           │
//! │              ScoringEngine ──► Relevance (layered, Ord)         │
//! │                     │                                           │
//! │                     ▼                                           │
//! │              ContextBuilder ──► bounded context string          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod context;
pub mod corpus;
pub mod error;
pub mod extraction;
pub mod markdown;
pub mod merge;
pub mod query;
pub mod record;
pub mod scoring;
pub mod tags;

pub use context::ContextBuilder;
pub use corpus::{Corpus, commit_prefix_matches};
pub use error::{RecordError, Result};
pub use extraction::{NotificationExtractor, RawNotification};
pub use query::{ParsedQuery, QueryMode};
pub use record::{MarkdownContent, Record, RecordKey};
pub use scoring::{RankedRecord, Relevance, ScoringEngine};
pub use tags::{RuleTagClassifier, TagClassify};
