//! Records stored in and returned by the similarity index.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default number of matches a query returns.
pub const DEFAULT_TOP_K: usize = 5;

/// Default minimum cosine similarity for a match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Compute the content fingerprint of a text: SHA-256, hex-encoded.
///
/// Used to detect duplicate content cheaply without comparing full texts.
pub fn fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Metadata stored alongside each embedding.
///
/// A metadata record exists exactly when its embedding does; the store
/// inserts and removes the two together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMetadata {
    /// The original text that was embedded.
    pub text: String,

    /// SHA-256 fingerprint of `text`.
    pub content_fingerprint: String,

    /// When the record was stored.
    pub stored_at: DateTime<Utc>,

    /// Caller-supplied attributes (e.g. `user_id`, `conversation_id`).
    pub attributes: HashMap<String, serde_json::Value>,
}

impl MemoryMetadata {
    /// Build a metadata record for `text`, stamping the fingerprint and
    /// storage time.
    pub fn new(text: impl Into<String>, attributes: HashMap<String, serde_json::Value>) -> Self {
        let text = text.into();
        Self {
            content_fingerprint: fingerprint(&text),
            stored_at: Utc::now(),
            text,
            attributes,
        }
    }

    /// Look up a caller-supplied attribute.
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}

/// A single query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    /// ID of the matched record.
    pub id: String,

    /// Cosine similarity against the query embedding.
    pub score: f32,

    /// The original stored text.
    pub text: String,

    /// The full metadata record.
    pub metadata: MemoryMetadata,
}

/// Statistics about the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of stored records.
    pub total_vectors: usize,

    /// Dimensionality of stored embeddings.
    pub embedding_dimension: usize,

    /// Model identity of the embedding provider in use.
    pub model_name: String,

    /// Which storage backend holds the vectors.
    pub storage_type: String,
}

/// Options controlling a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Maximum number of matches to return.
    pub top_k: usize,

    /// Minimum cosine similarity for a match.
    pub similarity_threshold: f32,

    /// Attribute filters. Every supplied filter must equal the stored
    /// attribute exactly (conjunctive); an empty map imposes no constraint.
    pub filters: HashMap<String, serde_json::Value>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            filters: HashMap::new(),
        }
    }
}

impl QueryOptions {
    /// Set the maximum number of matches.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum similarity.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Require an attribute to equal `value`.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        assert_eq!(fingerprint("hello"), fingerprint("hello"));
        assert_ne!(fingerprint("hello"), fingerprint("hello "));
        // SHA-256 hex digest is 64 characters.
        assert_eq!(fingerprint("hello").len(), 64);
    }

    #[test]
    fn test_metadata_stamps_fingerprint() {
        let meta = MemoryMetadata::new("some text", HashMap::new());
        assert_eq!(meta.text, "some text");
        assert_eq!(meta.content_fingerprint, fingerprint("some text"));
    }

    #[test]
    fn test_metadata_attribute_lookup() {
        let mut attributes = HashMap::new();
        attributes.insert("user_id".to_string(), serde_json::json!("alice"));
        let meta = MemoryMetadata::new("text", attributes);

        assert_eq!(meta.attribute("user_id"), Some(&serde_json::json!("alice")));
        assert_eq!(meta.attribute("missing"), None);
    }

    #[test]
    fn test_query_options_defaults() {
        let options = QueryOptions::default();
        assert_eq!(options.top_k, 5);
        assert_eq!(options.similarity_threshold, 0.7);
        assert!(options.filters.is_empty());
    }

    #[test]
    fn test_query_options_builders() {
        let options = QueryOptions::default()
            .with_top_k(3)
            .with_similarity_threshold(0.5)
            .with_filter("user_id", "alice");

        assert_eq!(options.top_k, 3);
        assert_eq!(options.similarity_threshold, 0.5);
        assert_eq!(
            options.filters.get("user_id"),
            Some(&serde_json::json!("alice"))
        );
    }
}
