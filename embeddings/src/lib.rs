//! # Embeddings
//!
//! This crate provides text-to-vector embedding generation and similarity
//! math for the Recall semantic memory service.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors via a provider
//! - **Similarity Ranking**: Cosine scoring with threshold and top-k cutoff
//! - **Multiple Providers**: OpenAI API or a deterministic local fallback
//! - **Caching**: In-memory caching of computed embeddings
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Embedding Pipeline                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingRequest ──► EmbeddingProvider ──► Embedding           │
//! │                            │                    │               │
//! │                            ▼                    ▼               │
//! │                    OpenAI / HashProvider    rank_top_k          │
//! │                            │                                    │
//! │                            ▼                                    │
//! │                      CachedProvider                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Providers are the sole expensive operation in the system: the OpenAI
//! provider suspends on the HTTP round-trip, and the local hash provider
//! runs its CPU work on a blocking worker. Neither blocks the async
//! scheduler, so concurrent callers keep making progress while an
//! embedding computes.

pub mod cache;
pub mod error;
pub mod provider;
pub mod similarity;

pub use cache::{CacheStats, CachedProvider, EmbeddingCache};
pub use error::{EmbeddingError, Result};
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, HashProvider, OpenAIProvider,
};
pub use similarity::{ScoredId, cosine_similarity, dot_product, normalize, rank_top_k};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings produced by the default model.
pub const DEFAULT_DIMENSION: usize = 1536; // OpenAI text-embedding-3-small
