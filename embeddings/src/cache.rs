//! Embedding cache used by the indexing phase.
//!
//! Re-indexing after new notifications arrive re-embeds mostly unchanged
//! records; the cache keeps those provider calls from repeating. Eviction
//! is oldest-insertion-first, tracked with a monotonic sequence number.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::Result;
use crate::provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};

/// Cache entry for one embedded text.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    embedding: Embedding,
    model: String,
    seq: u64,
}

/// Cache for embeddings to avoid redundant provider calls.
pub struct EmbeddingCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    cache_path: Option<PathBuf>,
    max_entries: usize,
    next_seq: Arc<RwLock<u64>>,
}

impl EmbeddingCache {
    /// Create a new in-memory cache.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            cache_path: None,
            max_entries,
            next_seq: Arc::new(RwLock::new(0)),
        }
    }

    /// Create a cache persisted at `path`, loading any existing contents.
    pub async fn with_persistence(path: impl AsRef<Path>, max_entries: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cache = Self {
            cache_path: Some(path.clone()),
            ..Self::new(max_entries)
        };

        if path.exists() {
            cache.load().await?;
        }

        Ok(cache)
    }

    /// Compute the lookup key for a text/model pair.
    fn cache_key(text: &str, model: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        model.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    /// Get a cached embedding.
    pub async fn get(&self, text: &str, model: &str) -> Option<Embedding> {
        let key = Self::cache_key(text, model);
        let entries = self.entries.read().await;
        entries.get(&key).map(|e| e.embedding.clone())
    }

    /// Store an embedding, evicting the oldest entry at capacity.
    pub async fn put(&self, text: &str, model: &str, embedding: Embedding) -> Result<()> {
        let key = Self::cache_key(text, model);

        let seq = {
            let mut next = self.next_seq.write().await;
            *next += 1;
            *next
        };

        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                embedding,
                model: model.to_string(),
                seq,
            },
        );
        debug!("Cached embedding (model: {model})");

        if self.cache_path.is_some() {
            drop(entries); // Release lock before I/O
            self.save().await?;
        }

        Ok(())
    }

    /// Number of cached embeddings.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop all cached entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("Cleared embedding cache");
    }

    async fn save(&self) -> Result<()> {
        if let Some(path) = &self.cache_path {
            let entries = self.entries.read().await;
            let stored: HashMap<&String, &CacheEntry> = entries.iter().collect();
            let content = serde_json::to_string(&stored)?;

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(path, content).await?;
            debug!("Saved {} cache entries to disk", entries.len());
        }
        Ok(())
    }

    async fn load(&self) -> Result<()> {
        if let Some(path) = &self.cache_path {
            let content = fs::read_to_string(path).await?;
            let stored: HashMap<String, CacheEntry> = serde_json::from_str(&content)?;

            let max_seq = stored.values().map(|e| e.seq).max().unwrap_or(0);
            *self.next_seq.write().await = max_seq;

            let mut entries = self.entries.write().await;
            *entries = stored;
            info!("Loaded {} cache entries from disk", entries.len());
        }
        Ok(())
    }
}

/// An embedding provider wrapper that consults the cache first.
///
/// Implements [`EmbeddingProvider`] itself, so it slots in anywhere the
/// bare provider would.
pub struct CachedEmbedder<P> {
    provider: P,
    cache: EmbeddingCache,
}

impl<P> CachedEmbedder<P>
where
    P: EmbeddingProvider,
{
    /// Wrap a provider with a cache.
    pub fn new(provider: P, cache: EmbeddingCache) -> Self {
        Self { provider, cache }
    }

    /// The wrapped cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

#[async_trait::async_trait]
impl<P> EmbeddingProvider for CachedEmbedder<P>
where
    P: EmbeddingProvider,
{
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn default_model(&self) -> &str {
        self.provider.default_model()
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string());

        if let Some(embedding) = self.cache.get(&request.text, &model).await {
            debug!("Embedding cache hit");
            let dimension = embedding.len();
            return Ok(EmbeddingResponse {
                embedding,
                model,
                dimension,
            });
        }

        let response = self.provider.embed(request.clone()).await?;
        self.cache
            .put(&request.text, &model, response.embedding.clone())
            .await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_cache_put_get() {
        let cache = EmbeddingCache::new(100);
        let embedding = vec![1.0, 2.0, 3.0];

        cache.put("hello", "model-1", embedding.clone()).await.unwrap();

        let retrieved = cache.get("hello", "model-1").await;
        assert_eq!(retrieved, Some(embedding));
    }

    #[tokio::test]
    async fn test_cache_miss_on_other_model() {
        let cache = EmbeddingCache::new(100);
        cache.put("hello", "model-1", vec![1.0]).await.unwrap();

        assert!(cache.get("hello", "model-2").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_eviction() {
        let cache = EmbeddingCache::new(2);

        cache.put("a", "model", vec![1.0]).await.unwrap();
        cache.put("b", "model", vec![2.0]).await.unwrap();
        cache.put("c", "model", vec![3.0]).await.unwrap();

        assert_eq!(cache.len().await, 2);
        // "a" was oldest and should be gone.
        assert!(cache.get("a", "model").await.is_none());
        assert!(cache.get("c", "model").await.is_some());
    }

    #[tokio::test]
    async fn test_cached_embedder_skips_provider_on_hit() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingProvider {
            calls: AtomicUsize,
        }

        #[async_trait::async_trait]
        impl EmbeddingProvider for CountingProvider {
            fn name(&self) -> &str {
                "counting"
            }

            fn default_model(&self) -> &str {
                "fake"
            }

            async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(EmbeddingResponse {
                    embedding: vec![1.0, 0.0],
                    model: "fake".to_string(),
                    dimension: 2,
                })
            }
        }

        let embedder = CachedEmbedder::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
            },
            EmbeddingCache::new(10),
        );

        embedder.embed(EmbeddingRequest::new("text")).await.unwrap();
        embedder.embed(EmbeddingRequest::new("text")).await.unwrap();

        assert_eq!(embedder.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_persistence_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("embeddings.json");

        {
            let cache = EmbeddingCache::with_persistence(&path, 10).await.unwrap();
            cache.put("hello", "model", vec![0.5, 0.5]).await.unwrap();
        }

        let cache = EmbeddingCache::with_persistence(&path, 10).await.unwrap();
        assert_eq!(cache.get("hello", "model").await, Some(vec![0.5, 0.5]));
    }
}
