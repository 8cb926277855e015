//! The query engine.
//!
//! `PrSearchEngine` wires the canonical corpus, the vector index, and
//! the two providers into one pipeline per query: dispatch → candidate
//! retrieval → layered ranking → context assembly → answer synthesis.
//! The corpus and index are immutable at query time; the only blocking
//! calls are the two provider round-trips.

use std::collections::HashMap;

use tracing::{debug, info};

use prmail_embeddings::{EmbeddingProvider, EmbeddingRequest, SimilarityIndex};
use prmail_records::{
    ContextBuilder, Corpus, ParsedQuery, QueryMode, Record, Relevance, RuleTagClassifier,
    ScoringEngine, TagClassify,
};

use crate::config::SearchConfig;
use crate::error::{QueryError, Result};
use crate::generate::{GenerationProvider, GenerationRequest, build_prompt};
use crate::history::ConversationHistory;

/// One retrieved record with its ranking signals.
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    /// Position in the corpus.
    pub position: usize,

    /// The record.
    pub record: &'a Record,

    /// Layered relevance against the original query.
    pub relevance: Relevance,

    /// Vector similarity, for hits that came through the index.
    pub similarity: Option<f32>,
}

/// The result of the retrieval half of a query.
#[derive(Debug, Clone)]
pub struct SearchOutcome<'a> {
    /// Which retrieval path ran.
    pub mode: QueryMode,

    /// Hits in final ranking order.
    pub hits: Vec<SearchHit<'a>>,

    /// Distinct repositories sharing the queried PR number.
    ///
    /// Non-empty only in PR mode when the number is ambiguous across
    /// repos; the ambiguity is surfaced here, never silently resolved.
    pub ambiguous_repos: Vec<String>,
}

/// A synthesized answer with the evidence behind it.
#[derive(Debug)]
pub struct QueryAnswer<'a> {
    /// The retrieval outcome the answer was built from.
    pub outcome: SearchOutcome<'a>,

    /// The bounded context handed to the generation service.
    pub context: String,

    /// The generated answer text.
    pub answer: String,
}

/// Statistics about an engine instance.
#[derive(Debug, Clone)]
pub struct EngineStats {
    /// Number of corpus records.
    pub records: usize,

    /// Number of indexed embeddings.
    pub embeddings: usize,
}

/// The retrieval-and-answer engine over a corpus of PR records.
pub struct PrSearchEngine {
    corpus: Corpus,
    index: SimilarityIndex,
    embedder: Box<dyn EmbeddingProvider>,
    generator: Box<dyn GenerationProvider>,
    classifier: Box<dyn TagClassify>,
    scoring: ScoringEngine,
    config: SearchConfig,
}

impl PrSearchEngine {
    /// Assemble an engine from a corpus and an already-built index.
    pub fn from_parts(
        corpus: Corpus,
        index: SimilarityIndex,
        embedder: Box<dyn EmbeddingProvider>,
        generator: Box<dyn GenerationProvider>,
        config: SearchConfig,
    ) -> Self {
        Self {
            corpus,
            index,
            embedder,
            generator,
            classifier: Box::new(RuleTagClassifier::new()),
            scoring: ScoringEngine::new(),
            config,
        }
    }

    /// Build an engine by embedding every corpus record.
    ///
    /// This is the indexing phase: it runs once, after which the corpus
    /// and index are read-only.
    pub async fn index_corpus(
        corpus: Corpus,
        embedder: Box<dyn EmbeddingProvider>,
        generator: Box<dyn GenerationProvider>,
        config: SearchConfig,
    ) -> Result<Self> {
        let mut embedded: Vec<(String, Vec<f32>)> = Vec::with_capacity(corpus.len());

        for (position, record) in corpus.iter() {
            let request = EmbeddingRequest {
                text: record.indexable_text(),
                model: config.embedding_model.clone(),
            };
            let response = embedder.embed(request).await?;
            embedded.push((position.to_string(), response.embedding));
        }

        let dimension = embedded
            .first()
            .map_or(prmail_embeddings::DEFAULT_DIMENSION, |(_, e)| e.len());

        let mut index = SimilarityIndex::new(dimension);
        for (id, embedding) in embedded {
            index.add(id, embedding)?;
        }

        info!(
            "Indexed {} records into a {dimension}-dimensional similarity index",
            corpus.len()
        );

        Ok(Self::from_parts(corpus, index, embedder, generator, config))
    }

    /// Replace the tag classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn TagClassify>) -> Self {
        self.classifier = classifier;
        self
    }

    /// The corpus this engine queries.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The vector index this engine queries.
    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Engine statistics.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            records: self.corpus.len(),
            embeddings: self.index.len(),
        }
    }

    /// Run the retrieval half of a query: dispatch, retrieve, rank.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome<'_>> {
        let mut parsed = ParsedQuery::parse(query);
        parsed.derive_tags(self.classifier.as_ref());

        let mode = QueryMode::from_parsed(&parsed);
        debug!("Dispatched query to {mode:?}");

        match mode.clone() {
            QueryMode::Commit { hash } => self.search_commit(&hash, &parsed, mode),
            QueryMode::Pr { number } => self.search_pr(number, &parsed, mode),
            QueryMode::Semantic { .. } => self.search_semantic(&parsed, mode).await,
        }
    }

    /// Commit mode: scan the corpus for prefix-matching commits.
    fn search_commit(
        &self,
        hash: &str,
        parsed: &ParsedQuery,
        mode: QueryMode,
    ) -> Result<SearchOutcome<'_>> {
        let candidates = self.corpus.find_by_commit(hash);
        if candidates.is_empty() {
            return Err(QueryError::NoMatches {
                what: format!("commit {hash}"),
            });
        }

        Ok(SearchOutcome {
            mode,
            hits: self.rank_hits(candidates, parsed, &HashMap::new()),
            ambiguous_repos: Vec::new(),
        })
    }

    /// PR mode: strict filter on the pull-request number, across repos.
    fn search_pr(
        &self,
        number: u32,
        parsed: &ParsedQuery,
        mode: QueryMode,
    ) -> Result<SearchOutcome<'_>> {
        let candidates = self.corpus.find_by_pr(number);
        if candidates.is_empty() {
            return Err(QueryError::NoMatches {
                what: format!("PR #{number}"),
            });
        }

        let mut repos: Vec<String> = candidates
            .iter()
            .filter_map(|(_, r)| r.repo.clone())
            .collect();
        repos.sort();
        repos.dedup();
        let ambiguous_repos = if repos.len() > 1 { repos } else { Vec::new() };

        Ok(SearchOutcome {
            mode,
            hits: self.rank_hits(candidates, parsed, &HashMap::new()),
            ambiguous_repos,
        })
    }

    /// Semantic mode: augmented vector search, reranked on the original
    /// query.
    async fn search_semantic(
        &self,
        parsed: &ParsedQuery,
        mode: QueryMode,
    ) -> Result<SearchOutcome<'_>> {
        if self.index.is_empty() {
            return Err(QueryError::NoMatches {
                what: "indexed records".to_string(),
            });
        }

        let augmented = parsed.augmented();
        debug!("Semantic retrieval with augmented query: {augmented}");

        let request = EmbeddingRequest {
            text: augmented,
            model: self.config.embedding_model.clone(),
        };
        let response = self.embedder.embed(request).await?;

        let results =
            self.index
                .search(&response.embedding, self.config.top_k, self.config.min_similarity)?;
        if results.is_empty() {
            return Err(QueryError::NoMatches {
                what: "sufficiently similar records".to_string(),
            });
        }

        // Resolve index ids back to corpus positions, keeping similarity
        // order so reranking ties preserve it.
        let mut candidates: Vec<(usize, &Record)> = Vec::with_capacity(results.len());
        let mut similarities: HashMap<usize, f32> = HashMap::new();
        for result in &results {
            let position: usize = result
                .id
                .parse()
                .map_err(|_| QueryError::UnknownDocumentId(result.id.clone()))?;
            let record = self
                .corpus
                .get(position)
                .ok_or_else(|| QueryError::UnknownDocumentId(result.id.clone()))?;
            candidates.push((position, record));
            similarities.insert(position, result.score);
        }

        Ok(SearchOutcome {
            mode,
            hits: self.rank_hits(candidates, parsed, &similarities),
            ambiguous_repos: Vec::new(),
        })
    }

    /// Rank candidates with the layered scorer and attach similarities.
    fn rank_hits<'a>(
        &self,
        candidates: Vec<(usize, &'a Record)>,
        parsed: &ParsedQuery,
        similarities: &HashMap<usize, f32>,
    ) -> Vec<SearchHit<'a>> {
        self.scoring
            .rank(candidates, parsed)
            .into_iter()
            .map(|ranked| SearchHit {
                position: ranked.position,
                record: ranked.record,
                relevance: ranked.relevance,
                similarity: similarities.get(&ranked.position).copied(),
            })
            .collect()
    }

    /// Answer a query end to end.
    pub async fn answer(&self, query: &str) -> Result<QueryAnswer<'_>> {
        self.answer_inner(query, None).await
    }

    /// Answer a query with prior conversation turns folded into the
    /// prompt; the new exchange is appended to `history` and persisted.
    pub async fn answer_with_history(
        &self,
        query: &str,
        history: &mut ConversationHistory,
    ) -> Result<QueryAnswer<'_>> {
        let rendered = history.render();
        let past = (!rendered.is_empty()).then_some(rendered);

        let answer = self.answer_inner(query, past.as_deref()).await?;

        history.push_user(query);
        history.push_assistant(answer.answer.clone());
        history.save().await?;

        Ok(answer)
    }

    async fn answer_inner(
        &self,
        query: &str,
        history: Option<&str>,
    ) -> Result<QueryAnswer<'_>> {
        let outcome = self.search(query).await?;

        let records: Vec<&Record> = outcome.hits.iter().map(|h| h.record).collect();
        let context = ContextBuilder::new()
            .with_excerpt_cap(self.config.excerpt_cap)
            .build(&records, self.config.context_budget);

        // Surface PR-number ambiguity to the model instead of guessing.
        let prompt_context = if outcome.ambiguous_repos.is_empty() {
            context.clone()
        } else {
            format!(
                "Note: the queried PR number exists in multiple repositories: {}. \
                 Make clear which repository each detail comes from.\n\n{context}",
                outcome.ambiguous_repos.join(", ")
            )
        };

        let prompt = build_prompt(query, &prompt_context, history);
        let request = GenerationRequest {
            prompt,
            model: self.config.generation_model.clone(),
        };
        let response = self.generator.generate(request).await?;

        Ok(QueryAnswer {
            outcome,
            context,
            answer: response.text,
        })
    }
}
