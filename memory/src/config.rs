//! Configuration for the semantic memory service.

use serde::{Deserialize, Serialize};

use crate::record::{DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K};

/// Configuration for the semantic memory service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Embedding provider configuration.
    pub embedding: EmbeddingConfig,

    /// Which storage backend holds the vectors.
    pub storage: StorageBackend,

    /// Query defaults applied when the caller does not override them.
    pub query: QueryDefaults,
}

impl MemoryConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embedding configuration.
    pub fn with_embedding(mut self, config: EmbeddingConfig) -> Self {
        self.embedding = config;
        self
    }

    /// Set the storage backend.
    pub fn with_storage(mut self, backend: StorageBackend) -> Self {
        self.storage = backend;
        self
    }

    /// Set the query defaults.
    pub fn with_query(mut self, defaults: QueryDefaults) -> Self {
        self.query = defaults;
        self
    }
}

/// Configuration for the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Which provider to use.
    pub provider: EmbeddingProviderKind,

    /// Model to use for embeddings (provider default when unset).
    pub model: Option<String>,

    /// Whether to cache computed embeddings.
    pub cache_enabled: bool,

    /// Maximum cache size.
    pub cache_max_entries: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::OpenAI,
            model: None,
            cache_enabled: true,
            cache_max_entries: 10000,
        }
    }
}

/// Type of embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// OpenAI embeddings API.
    OpenAI,
    /// Deterministic local token hashing (offline; tests and development).
    LocalHash,
}

/// Which backend stores the vectors.
///
/// An enum rather than a bool so a persistent backend can be added as a
/// configuration choice without rewriting callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Map-backed storage inside the current process.
    #[default]
    InMemory,
}

/// Query defaults applied when the caller does not override them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Maximum number of matches to return.
    pub top_k: usize,

    /// Minimum cosine similarity for a match.
    pub similarity_threshold: f32,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}
