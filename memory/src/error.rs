//! Error types for the semantic memory service.

use thiserror::Error;

/// Result type alias for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors that can occur in the semantic memory service.
///
/// Embedding failure is the sole failure mode of store and query; it is
/// surfaced through this enum rather than panicking, so callers can tell
/// "the query failed" apart from "nothing matched".
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] recall_embeddings::EmbeddingError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
