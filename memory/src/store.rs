//! Vector storage backends.
//!
//! Storage is a capability behind the [`VectorStore`] trait so the backend
//! is a configuration choice: the in-memory store here today, a persistent
//! vector database later, without touching callers.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use recall_embeddings::{Embedding, EmbeddingError, rank_top_k};

use crate::error::Result;
use crate::record::{Match, MemoryMetadata, QueryOptions};

/// Storage for embeddings and their metadata records.
///
/// Implementations own both mappings (id → vector, id → metadata) and keep
/// them consistent: a reader can never observe an id present in one and
/// absent from the other.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or fully replace the record for `id`. Last write wins.
    async fn upsert(&self, id: String, embedding: Embedding, metadata: MemoryMetadata)
    -> Result<()>;

    /// Remove the record for `id` from both mappings. Returns whether a
    /// record was present; removing an absent id is a no-op, not an error.
    async fn remove(&self, id: &str) -> bool;

    /// Score every stored record against `query` and return the matches
    /// that survive the threshold and attribute filters, best first,
    /// truncated to `options.top_k`.
    async fn search(&self, query: &Embedding, options: &QueryOptions) -> Result<Vec<Match>>;

    /// Number of stored records.
    async fn len(&self) -> usize;

    /// Whether the store holds no records.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Dimensionality this store accepts.
    fn dimension(&self) -> usize;

    /// Identifier of the backend (e.g. `"in_memory"`), reported in stats.
    fn storage_type(&self) -> &'static str;
}

/// True when every supplied filter equals the stored attribute exactly.
fn matches_filters(
    metadata: &MemoryMetadata,
    filters: &HashMap<String, serde_json::Value>,
) -> bool {
    filters
        .iter()
        .all(|(key, want)| metadata.attributes.get(key) == Some(want))
}

/// The two mappings, guarded together.
struct Inner {
    vectors: HashMap<String, Embedding>,
    metadata: HashMap<String, MemoryMetadata>,
}

/// Map-backed vector store inside the current process.
///
/// Both maps live behind one lock: any write updates them together, so the
/// pair is always observed either fully old or fully new for a given id.
/// Nothing is persisted; the store dies with the process.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    dimension: usize,
}

impl InMemoryStore {
    /// Create a store accepting embeddings of exactly `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                vectors: HashMap::new(),
                metadata: HashMap::new(),
            }),
            dimension,
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(
        &self,
        id: String,
        embedding: Embedding,
        metadata: MemoryMetadata,
    ) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            }
            .into());
        }

        let mut inner = self.inner.write().await;
        // Both maps change under the same write lock: readers see the old
        // pair or the new pair, never a mix.
        inner.vectors.insert(id.clone(), embedding);
        inner.metadata.insert(id.clone(), metadata);
        debug!("stored embedding for {id}");

        Ok(())
    }

    async fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.vectors.remove(id).is_some();
        inner.metadata.remove(id);

        if removed {
            debug!("removed record {id}");
        }
        removed
    }

    async fn search(&self, query: &Embedding, options: &QueryOptions) -> Result<Vec<Match>> {
        let inner = self.inner.read().await;

        // Candidates are snapshotted under the read lock; a concurrent
        // upsert or remove waits for the lock rather than racing the
        // iteration.
        let candidates: Vec<(String, Embedding)> = inner
            .vectors
            .iter()
            .filter(|(id, _)| {
                inner
                    .metadata
                    .get(*id)
                    .is_some_and(|meta| matches_filters(meta, &options.filters))
            })
            .map(|(id, vector)| (id.clone(), vector.clone()))
            .collect();

        let ranked = rank_top_k(
            query,
            &candidates,
            options.top_k,
            options.similarity_threshold,
        )?;

        Ok(ranked
            .into_iter()
            .filter_map(|scored| {
                inner.metadata.get(&scored.id).map(|meta| Match {
                    id: scored.id,
                    score: scored.score,
                    text: meta.text.clone(),
                    metadata: meta.clone(),
                })
            })
            .collect())
    }

    async fn len(&self) -> usize {
        self.inner.read().await.vectors.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn storage_type(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta(text: &str) -> MemoryMetadata {
        MemoryMetadata::new(text, HashMap::new())
    }

    fn meta_with(text: &str, key: &str, value: &str) -> MemoryMetadata {
        let mut attributes = HashMap::new();
        attributes.insert(key.to_string(), serde_json::json!(value));
        MemoryMetadata::new(text, attributes)
    }

    #[tokio::test]
    async fn test_upsert_and_search() {
        let store = InMemoryStore::new(3);
        store
            .upsert("a".to_string(), vec![1.0, 0.0, 0.0], meta("alpha"))
            .await
            .unwrap();
        store
            .upsert("b".to_string(), vec![0.0, 1.0, 0.0], meta("beta"))
            .await
            .unwrap();

        let matches = store
            .search(
                &vec![1.0, 0.0, 0.0],
                &QueryOptions::default().with_similarity_threshold(0.5),
            )
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[0].text, "alpha");
        assert!((matches[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_upsert_rejects_wrong_dimension() {
        let store = InMemoryStore::new(3);
        let result = store
            .upsert("bad".to_string(), vec![1.0, 0.0], meta("bad"))
            .await;
        assert!(result.is_err());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_upsert_replaces_fully() {
        let store = InMemoryStore::new(2);
        store
            .upsert("a".to_string(), vec![1.0, 0.0], meta("first"))
            .await
            .unwrap();
        store
            .upsert("a".to_string(), vec![0.0, 1.0], meta("second"))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);

        let inner = store.inner.read().await;
        assert_eq!(inner.vectors.get("a"), Some(&vec![0.0, 1.0]));
        assert_eq!(inner.metadata.get("a").map(|m| m.text.as_str()), Some("second"));
    }

    #[tokio::test]
    async fn test_both_maps_stay_consistent() {
        let store = InMemoryStore::new(2);
        store
            .upsert("a".to_string(), vec![1.0, 0.0], meta("a"))
            .await
            .unwrap();
        store
            .upsert("b".to_string(), vec![0.0, 1.0], meta("b"))
            .await
            .unwrap();
        store.remove("a").await;
        store
            .upsert("c".to_string(), vec![1.0, 1.0], meta("c"))
            .await
            .unwrap();

        let inner = store.inner.read().await;
        assert_eq!(inner.vectors.len(), inner.metadata.len());
        for id in inner.vectors.keys() {
            assert!(inner.metadata.contains_key(id), "metadata missing for {id}");
        }
        for id in inner.metadata.keys() {
            assert!(inner.vectors.contains_key(id), "vector missing for {id}");
        }
    }

    #[tokio::test]
    async fn test_remove_absent_id_is_noop() {
        let store = InMemoryStore::new(2);
        assert!(!store.remove("ghost").await);

        store
            .upsert("a".to_string(), vec![1.0, 0.0], meta("a"))
            .await
            .unwrap();
        assert!(store.remove("a").await);
        assert!(!store.remove("a").await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_filters_are_conjunctive() {
        let store = InMemoryStore::new(2);
        let mut both = HashMap::new();
        both.insert("user_id".to_string(), serde_json::json!("alice"));
        both.insert("conversation_id".to_string(), serde_json::json!("c1"));
        store
            .upsert(
                "a".to_string(),
                vec![1.0, 0.0],
                MemoryMetadata::new("a", both),
            )
            .await
            .unwrap();
        store
            .upsert(
                "b".to_string(),
                vec![1.0, 0.0],
                meta_with("b", "user_id", "alice"),
            )
            .await
            .unwrap();

        let options = QueryOptions::default()
            .with_similarity_threshold(0.0)
            .with_filter("user_id", "alice")
            .with_filter("conversation_id", "c1");

        let matches = store.search(&vec![1.0, 0.0], &options).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a");
    }

    #[tokio::test]
    async fn test_search_query_dimension_mismatch_is_error() {
        let store = InMemoryStore::new(2);
        store
            .upsert("a".to_string(), vec![1.0, 0.0], meta("a"))
            .await
            .unwrap();

        let result = store
            .search(&vec![1.0, 0.0, 0.0], &QueryOptions::default())
            .await;
        assert!(result.is_err());
    }
}
