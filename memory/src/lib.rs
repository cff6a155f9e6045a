//! # Memory
//!
//! This crate provides the Recall semantic memory service: an in-process
//! similarity index over text embeddings.
//!
//! Text goes in under a caller-chosen id; the service embeds it, stores the
//! vector alongside a metadata record (original text, content fingerprint,
//! storage timestamp, arbitrary attributes), and answers top-k similarity
//! queries subject to a score threshold and attribute filters.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Semantic Memory                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  remember ──► EmbeddingProvider ──► VectorStore.upsert          │
//! │  recall   ──► EmbeddingProvider ──► VectorStore.search          │
//! │  forget   ──────────────────────► VectorStore.remove            │
//! │  stats    ──────────────────────► VectorStore / provider        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The service is an explicitly constructed object, not a global: create
//! one per process (or several in tests) via [`SemanticMemory::builder`]
//! and share it by handle.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recall_memory::{MemoryConfig, QueryOptions, SemanticMemory};
//!
//! let memory = SemanticMemory::builder()
//!     .with_config(MemoryConfig::default())
//!     .build()?;
//!
//! memory.remember("m1", "The cat sat on the mat", attributes).await?;
//! let matches = memory.recall("where did the cat sit?", QueryOptions::default()).await?;
//! ```

pub mod config;
pub mod error;
pub mod record;
pub mod service;
pub mod store;

pub use config::{EmbeddingConfig, EmbeddingProviderKind, MemoryConfig, QueryDefaults, StorageBackend};
pub use error::{MemoryError, Result};
pub use record::{IndexStats, Match, MemoryMetadata, QueryOptions, fingerprint};
pub use service::{SemanticMemory, SemanticMemoryBuilder};
pub use store::{InMemoryStore, VectorStore};

// Re-export from dependencies for convenience
pub use recall_embeddings::{Embedding, EmbeddingError, EmbeddingProvider};
