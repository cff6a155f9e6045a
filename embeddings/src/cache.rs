//! In-memory caching of computed embeddings.
//!
//! Providers are deterministic, so an embedding computed once for a given
//! (text, model) pair can be reused for the lifetime of the process. The
//! cache lives entirely in memory; it dies with the process.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::Result;
use crate::provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};

/// Cache entry for an embedding.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The embedding vector.
    embedding: Embedding,

    /// Model used to generate the embedding.
    model: String,

    /// Insertion order, used for oldest-first eviction.
    tick: u64,
}

/// Cache for embeddings to avoid redundant provider calls.
///
/// Keys are a hash of (text, model): the same text embedded under two
/// different models occupies two entries. When full, the oldest entry is
/// evicted. `max_entries` should be at least 1.
pub struct EmbeddingCache {
    /// Cached entries keyed by hash of (text, model).
    entries: RwLock<HashMap<String, CacheEntry>>,

    /// Maximum cache size.
    max_entries: usize,

    /// Monotonic insertion counter.
    tick: AtomicU64,
}

impl EmbeddingCache {
    /// Create a new cache holding at most `max_entries` embeddings.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
            tick: AtomicU64::new(0),
        }
    }

    /// Compute a hash for cache lookup.
    fn hash_key(text: &str, model: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        model.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    /// Get an embedding from the cache.
    pub async fn get(&self, text: &str, model: &str) -> Option<Embedding> {
        let key = Self::hash_key(text, model);
        let entries = self.entries.read().await;
        entries.get(&key).map(|e| e.embedding.clone())
    }

    /// Put an embedding in the cache, evicting the oldest entry if full.
    pub async fn put(&self, text: &str, model: &str, embedding: Embedding) {
        let key = Self::hash_key(text, model);
        let entry = CacheEntry {
            embedding,
            model: model.to_string(),
            tick: self.tick.fetch_add(1, Ordering::Relaxed),
        };

        let mut entries = self.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            if let Some(oldest_key) = entries
                .iter()
                .min_by_key(|(_, v)| v.tick)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest_key);
            }
        }

        entries.insert(key, entry);
        debug!("cached embedding for text (model: {model})");
    }

    /// Check if an embedding is cached.
    pub async fn contains(&self, text: &str, model: &str) -> bool {
        let key = Self::hash_key(text, model);
        self.entries.read().await.contains_key(&key)
    }

    /// Remove an embedding from the cache.
    pub async fn remove(&self, text: &str, model: &str) {
        let key = Self::hash_key(text, model);
        self.entries.write().await.remove(&key);
    }

    /// Clear the entire cache.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("cleared embedding cache");
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        CacheStats {
            entries: entries.len(),
            max_entries: self.max_entries,
            models: entries
                .values()
                .map(|e| e.model.clone())
                .collect::<std::collections::HashSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}

/// Statistics about the embedding cache.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of entries in cache.
    pub entries: usize,

    /// Maximum cache size.
    pub max_entries: usize,

    /// Models with cached embeddings.
    pub models: Vec<String>,
}

/// A provider wrapper that caches embeddings.
///
/// Implements [`EmbeddingProvider`] itself, so callers hold one
/// `Arc<dyn EmbeddingProvider>` whether or not caching is enabled.
pub struct CachedProvider {
    inner: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
}

impl CachedProvider {
    /// Wrap a provider with a cache.
    pub fn new(inner: Arc<dyn EmbeddingProvider>, cache: EmbeddingCache) -> Self {
        Self { inner, cache }
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

#[async_trait]
impl EmbeddingProvider for CachedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    fn default_dimension(&self) -> usize {
        self.inner.default_dimension()
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.inner.default_model().to_string());

        if let Some(embedding) = self.cache.get(&request.text, &model).await {
            debug!("embedding cache hit");
            return Ok(EmbeddingResponse {
                dimension: embedding.len(),
                embedding,
                model,
                tokens_used: None,
            });
        }

        let text = request.text.clone();
        let response = self.inner.embed(request).await?;
        self.cache.put(&text, &model, response.embedding.clone()).await;

        Ok(response)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
