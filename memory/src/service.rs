//! The semantic memory service.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use recall_embeddings::{
    CachedProvider, EmbeddingCache, EmbeddingProvider, EmbeddingRequest, HashProvider,
    OpenAIProvider,
};

use crate::config::{EmbeddingProviderKind, MemoryConfig, QueryDefaults, StorageBackend};
use crate::error::{MemoryError, Result};
use crate::record::{IndexStats, Match, MemoryMetadata, QueryOptions};
use crate::store::{InMemoryStore, VectorStore};

/// The process-wide semantic memory service.
///
/// Owns an embedding provider and a vector store, and exposes the four
/// operations of the index: [`remember`](Self::remember),
/// [`recall`](Self::recall), [`forget`](Self::forget) and
/// [`stats`](Self::stats).
///
/// The embedding call is the only suspension point in remember/recall, and
/// no store lock is held across it, so concurrent callers keep making
/// progress while an embedding computes. Dropping a remember/recall future
/// mid-embed leaves the store untouched: nothing is written until the
/// embedding has arrived.
pub struct SemanticMemory {
    /// Embedding provider.
    provider: Arc<dyn EmbeddingProvider>,

    /// Vector storage backend.
    store: Arc<dyn VectorStore>,

    /// Query defaults from configuration.
    query_defaults: QueryDefaults,
}

impl SemanticMemory {
    /// Create a new service builder.
    pub fn builder() -> SemanticMemoryBuilder {
        SemanticMemoryBuilder::new()
    }

    /// Embed `text` and store it under `id` with the supplied attributes.
    ///
    /// Storing an existing `id` fully replaces its record (last write
    /// wins). On embedding failure nothing is written: the record either
    /// exists in full, with vector and metadata from the same call, or not
    /// at all.
    pub async fn remember(
        &self,
        id: impl Into<String>,
        text: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        let id = id.into();
        let text = text.into();

        let response = match self.provider.embed(EmbeddingRequest::new(text.clone())).await {
            Ok(response) => response,
            Err(e) => {
                warn!("embedding failed while storing {id}: {e}");
                return Err(e.into());
            }
        };

        let metadata = MemoryMetadata::new(text, attributes);
        self.store.upsert(id.clone(), response.embedding, metadata).await?;
        debug!("remembered {id}");

        Ok(())
    }

    /// Find stored records similar to `text`.
    ///
    /// Returns the surviving matches best first, truncated to
    /// `options.top_k`. An empty index short-circuits to an empty result
    /// without computing an embedding. A failed query embedding is an
    /// `Err`, deliberately distinguishable from `Ok` with no matches.
    pub async fn recall(
        &self,
        text: impl Into<String>,
        options: QueryOptions,
    ) -> Result<Vec<Match>> {
        // An empty index never computes an embedding.
        if self.store.is_empty().await {
            return Ok(Vec::new());
        }

        let response = match self.provider.embed(EmbeddingRequest::new(text.into())).await {
            Ok(response) => response,
            Err(e) => {
                warn!("embedding failed for query: {e}");
                return Err(e.into());
            }
        };

        let matches = self.store.search(&response.embedding, &options).await?;
        debug!("recall returned {} matches", matches.len());

        Ok(matches)
    }

    /// Remove the record stored under `id`, if any.
    ///
    /// Idempotent and infallible: removing an absent id is a successful
    /// no-op. Returns whether a record was actually removed.
    pub async fn forget(&self, id: &str) -> bool {
        let removed = self.store.remove(id).await;
        if removed {
            debug!("forgot {id}");
        }
        removed
    }

    /// Get index statistics. Pure read; never fails.
    pub async fn stats(&self) -> IndexStats {
        IndexStats {
            total_vectors: self.store.len().await,
            embedding_dimension: self.store.dimension(),
            model_name: self.provider.default_model().to_string(),
            storage_type: self.store.storage_type().to_string(),
        }
    }

    /// Query options seeded from the configured defaults.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .with_top_k(self.query_defaults.top_k)
            .with_similarity_threshold(self.query_defaults.similarity_threshold)
    }
}

/// Builder for the semantic memory service.
pub struct SemanticMemoryBuilder {
    config: MemoryConfig,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
}

impl SemanticMemoryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: MemoryConfig::default(),
            provider: None,
            store: None,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: MemoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Supply a provider directly, bypassing configuration-based selection.
    /// This is how tests plug in a double.
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Supply a store directly, bypassing configuration-based selection.
    pub fn with_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the service.
    pub fn build(self) -> Result<SemanticMemory> {
        let embedding = &self.config.embedding;

        if embedding.cache_enabled && embedding.cache_max_entries == 0 {
            return Err(MemoryError::Config(
                "cache_max_entries must be nonzero when caching is enabled".to_string(),
            ));
        }

        let provider = match self.provider {
            Some(provider) => provider,
            None => match embedding.provider {
                EmbeddingProviderKind::OpenAI => {
                    let mut provider = OpenAIProvider::new();
                    if let Some(model) = &embedding.model {
                        provider = provider.with_model(model);
                    }
                    Arc::new(provider) as Arc<dyn EmbeddingProvider>
                }
                EmbeddingProviderKind::LocalHash => Arc::new(HashProvider::new()),
            },
        };

        let provider: Arc<dyn EmbeddingProvider> = if embedding.cache_enabled {
            Arc::new(CachedProvider::new(
                provider,
                EmbeddingCache::new(embedding.cache_max_entries),
            ))
        } else {
            provider
        };

        let dimension = provider.default_dimension();
        let store = match self.store {
            Some(store) => store,
            None => match self.config.storage {
                StorageBackend::InMemory => Arc::new(InMemoryStore::new(dimension)),
            },
        };

        info!(
            "semantic memory ready: provider={}, model={}, dimension={}, storage={}",
            provider.name(),
            provider.default_model(),
            dimension,
            store.storage_type()
        );

        Ok(SemanticMemory {
            provider,
            store,
            query_defaults: self.config.query,
        })
    }
}

impl Default for SemanticMemoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
