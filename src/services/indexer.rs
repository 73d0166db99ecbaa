//! Text indexing and search pipeline.
//!
//! [`TextIndexer`] composes an embedding provider and a vector store into
//! text-level operations: index creation, batched upsert and batched
//! similarity search against one named collection.
//!
//! Every operation comes in two flavors. The `try_*` methods return typed
//! errors and are the primary API. The unprefixed methods offer a sentinel
//! contract instead: failures are logged and collapsed into `false` or an
//! empty result list, which makes a failed query indistinguishable from one
//! with no matches.

use std::sync::Arc;
use tracing::warn;

use super::batch::batch_ranges;
use super::embedding::Embedder;
use super::store::VectorStore;
use crate::error::{IndexError, StoreError};
use crate::models::{Payload, Point, PointId, SearchResult};

/// Indexing and search pipeline over one collection.
///
/// Holds the embedder and store by shared reference and mutates no state of
/// its own, so clones are cheap and any number of calls may be in flight
/// concurrently. Within a single call, chunks are processed sequentially.
#[derive(Clone)]
pub struct TextIndexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl TextIndexer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
        }
    }

    /// Build an indexer from configuration: HTTP embedder plus remote
    /// Qdrant backend.
    pub fn connect(
        config: &crate::models::Config,
        collection: impl Into<String>,
    ) -> Result<Self, IndexError> {
        let embedder = super::embedding::HttpEmbedder::new(&config.embedding)?;
        let store = super::store::QdrantStore::new(&config.store)?;
        Ok(Self::new(Arc::new(embedder), Arc::new(store), collection))
    }

    /// The collection this indexer reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection, sized to the embedder's dimensionality.
    ///
    /// Without `force`, an existing collection makes the call fail with
    /// [`StoreError::CollectionExists`]. With `force`, any existing
    /// collection is deleted first; a missing one is tolerated.
    pub async fn try_create_index(&self, force: bool) -> Result<(), IndexError> {
        if force {
            match self.store.delete_collection(&self.collection).await {
                Ok(()) | Err(StoreError::CollectionNotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        } else if self.store.collection_exists(&self.collection).await? {
            return Err(StoreError::CollectionExists(self.collection.clone()).into());
        }

        self.store
            .create_collection(&self.collection, self.embedder.dimension())
            .await?;
        Ok(())
    }

    /// Embed `texts` in one call and upsert them as a single store write.
    ///
    /// When `ids` is omitted, fresh UUID identifiers are generated; when
    /// `metadata` is omitted, each payload defaults to `{"title": text}`.
    pub async fn try_add_texts(
        &self,
        texts: &[String],
        ids: Option<Vec<PointId>>,
        metadata: Option<Vec<Payload>>,
    ) -> Result<(), IndexError> {
        if let Some(ref ids) = ids
            && ids.len() != texts.len()
        {
            return Err(IndexError::InvalidInput(format!(
                "got {} ids for {} texts",
                ids.len(),
                texts.len()
            )));
        }
        if let Some(ref metadata) = metadata
            && metadata.len() != texts.len()
        {
            return Err(IndexError::InvalidInput(format!(
                "got {} metadata entries for {} texts",
                metadata.len(),
                texts.len()
            )));
        }

        let vectors = self.embedder.embed(texts).await?;

        let ids = ids.unwrap_or_else(|| {
            texts
                .iter()
                .map(|_| PointId::Uuid(uuid::Uuid::new_v4().to_string()))
                .collect()
        });

        let points: Vec<Point> = match metadata {
            Some(metadata) => ids
                .into_iter()
                .zip(vectors)
                .zip(metadata)
                .map(|((id, vector), payload)| Point::new(id, vector).with_payload(payload))
                .collect(),
            None => ids
                .into_iter()
                .zip(vectors)
                .zip(texts)
                .map(|((id, vector), text)| Point::titled(id, vector, text))
                .collect(),
        };

        self.store.upsert_points(&self.collection, points).await?;
        Ok(())
    }

    /// Embed `texts` in one call, then upsert them in chunks of `batch_size`.
    ///
    /// Points get positional integer ids and `{"title": text}` payloads.
    /// Fails fast: the first chunk that the store rejects aborts the
    /// remaining chunks, leaving earlier chunks committed — there is no
    /// rollback.
    pub async fn try_add_texts_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<(), IndexError> {
        let vectors = self.embedder.embed(texts).await?;

        let points: Vec<Point> = vectors
            .into_iter()
            .zip(texts)
            .enumerate()
            .map(|(i, (vector, text))| Point::titled(i as u64, vector, text))
            .collect();

        for range in batch_ranges(points.len(), batch_size) {
            self.store
                .upsert_points(&self.collection, points[range].to_vec())
                .await?;
        }
        Ok(())
    }

    /// Upsert pre-computed vectors with `{"title": text}` payloads, for
    /// callers that run their own embedding step.
    pub async fn try_add_vectors(
        &self,
        vectors: Vec<Vec<f32>>,
        texts: &[String],
    ) -> Result<(), IndexError> {
        if vectors.len() != texts.len() {
            return Err(IndexError::InvalidInput(format!(
                "got {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        let points: Vec<Point> = vectors
            .into_iter()
            .zip(texts)
            .map(|(vector, text)| {
                Point::titled(PointId::Uuid(uuid::Uuid::new_v4().to_string()), vector, text)
            })
            .collect();

        self.store.upsert_points(&self.collection, points).await?;
        Ok(())
    }

    /// Embed one query text and return its ranked matches.
    pub async fn try_search(
        &self,
        query: &str,
        limit: u64,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let vectors = self.embedder.embed(&[query.to_string()]).await?;
        let vector = vectors.into_iter().next().ok_or_else(|| {
            IndexError::Embedding(crate::error::EmbeddingError::InvalidResponse(
                "empty embedding response".to_string(),
            ))
        })?;
        self.try_search_by_vector(vector, limit, score_threshold)
            .await
    }

    /// Rank matches for a caller-provided vector, skipping the embedding
    /// step.
    pub async fn try_search_by_vector(
        &self,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let results = self
            .store
            .query(&self.collection, vector, limit, score_threshold)
            .await?;
        Ok(results)
    }

    /// Embed all queries in one call, then run one store query per vector.
    ///
    /// Queries are partitioned into request groups of `batch_size`
    /// (0 = one group); groups and the queries within them run sequentially,
    /// and the result list preserves input order, with
    /// `results[i]` belonging to `queries[i]`. Any per-query failure fails
    /// the whole call; there is no per-query isolation.
    pub async fn try_search_batch(
        &self,
        queries: &[String],
        limit: u64,
        score_threshold: f32,
        batch_size: usize,
    ) -> Result<Vec<Vec<SearchResult>>, IndexError> {
        let vectors = self.embedder.embed(queries).await?;

        let mut results = Vec::with_capacity(vectors.len());
        for range in batch_ranges(vectors.len(), batch_size) {
            for vector in &vectors[range] {
                let hits = self
                    .store
                    .query(&self.collection, vector.clone(), limit, score_threshold)
                    .await?;
                results.push(hits);
            }
        }
        Ok(results)
    }

    // --- Sentinel-compatible surface -----------------------------------
    //
    // These mirror the try_* methods but never surface an error: mutating
    // operations report bare success, read operations report an empty list.

    pub async fn create_index(&self, force: bool) -> bool {
        match self.try_create_index(force).await {
            Ok(()) => true,
            Err(e) => {
                warn!("create_index failed for '{}': {}", self.collection, e);
                false
            }
        }
    }

    pub async fn add_texts(
        &self,
        texts: &[String],
        ids: Option<Vec<PointId>>,
        metadata: Option<Vec<Payload>>,
    ) -> bool {
        match self.try_add_texts(texts, ids, metadata).await {
            Ok(()) => true,
            Err(e) => {
                warn!("add_texts failed for '{}': {}", self.collection, e);
                false
            }
        }
    }

    pub async fn add_texts_batch(&self, texts: &[String], batch_size: usize) -> bool {
        match self.try_add_texts_batch(texts, batch_size).await {
            Ok(()) => true,
            Err(e) => {
                warn!("add_texts_batch failed for '{}': {}", self.collection, e);
                false
            }
        }
    }

    pub async fn add_vectors(&self, vectors: Vec<Vec<f32>>, texts: &[String]) -> bool {
        match self.try_add_vectors(vectors, texts).await {
            Ok(()) => true,
            Err(e) => {
                warn!("add_vectors failed for '{}': {}", self.collection, e);
                false
            }
        }
    }

    pub async fn search(
        &self,
        query: &str,
        limit: u64,
        score_threshold: f32,
    ) -> Vec<SearchResult> {
        match self.try_search(query, limit, score_threshold).await {
            Ok(results) => results,
            Err(e) => {
                warn!("search failed for '{}': {}", self.collection, e);
                Vec::new()
            }
        }
    }

    pub async fn search_by_vector(
        &self,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: f32,
    ) -> Vec<SearchResult> {
        match self
            .try_search_by_vector(vector, limit, score_threshold)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!("search_by_vector failed for '{}': {}", self.collection, e);
                Vec::new()
            }
        }
    }

    pub async fn search_batch(
        &self,
        queries: &[String],
        limit: u64,
        score_threshold: f32,
        batch_size: usize,
    ) -> Vec<Vec<SearchResult>> {
        match self
            .try_search_batch(queries, limit, score_threshold, batch_size)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!("search_batch failed for '{}': {}", self.collection, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use crate::services::store::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DIM: usize = 4;

    /// Deterministic embedder: known words map to orthogonal unit vectors.
    struct FakeEmbedder;

    fn fake_vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        match text {
            "alpha" => v[0] = 1.0,
            "beta" => v[1] = 1.0,
            "gamma" => v[2] = 1.0,
            "delta" => v[3] = 1.0,
            other => {
                let sum: usize = other.bytes().map(|b| b as usize).sum();
                v[sum % DIM] = 0.5;
                v[(sum + 1) % DIM] = 0.5;
            }
        }
        v
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        fn dimension(&self) -> u64 {
            DIM as u64
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| fake_vector(t)).collect())
        }
    }

    /// Embedder that always fails.
    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        fn dimension(&self) -> u64 {
            DIM as u64
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::Timeout)
        }
    }

    /// Store wrapper that rejects every upsert after the first `allowed`.
    struct FlakyStore {
        inner: Arc<InMemoryStore>,
        allowed: usize,
        seen: AtomicUsize,
    }

    #[async_trait]
    impl VectorStore for FlakyStore {
        async fn create_collection(&self, name: &str, size: u64) -> Result<(), StoreError> {
            self.inner.create_collection(name, size).await
        }

        async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
            self.inner.delete_collection(name).await
        }

        async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
            self.inner.collection_exists(name).await
        }

        async fn upsert_points(&self, name: &str, points: Vec<Point>) -> Result<(), StoreError> {
            if self.seen.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(StoreError::UpsertError("injected failure".to_string()));
            }
            self.inner.upsert_points(name, points).await
        }

        async fn query(
            &self,
            name: &str,
            vector: Vec<f32>,
            limit: u64,
            score_threshold: f32,
        ) -> Result<Vec<SearchResult>, StoreError> {
            self.inner.query(name, vector, limit, score_threshold).await
        }
    }

    fn indexer_with_store(store: Arc<dyn VectorStore>) -> TextIndexer {
        TextIndexer::new(Arc::new(FakeEmbedder), store, "test_collection")
    }

    fn texts(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_index_refuses_repeat_without_force() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store);

        assert!(indexer.create_index(false).await);
        assert!(!indexer.create_index(false).await);
        assert!(indexer.create_index(true).await);
    }

    #[tokio::test]
    async fn test_create_index_force_on_fresh_store() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store.clone());

        // Nothing to delete yet; force still succeeds
        assert!(indexer.create_index(true).await);
        assert!(store.collection_exists("test_collection").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_texts_default_ids_and_payload() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store.clone());
        indexer.create_index(false).await;

        assert!(
            indexer
                .add_texts(&texts(&["alpha", "beta", "gamma"]), None, None)
                .await
        );
        assert_eq!(store.point_count("test_collection").await, 3);
        // Single store write for the whole call
        assert_eq!(store.upsert_calls(), 1);

        let results = indexer.search("alpha", 1, 0.0).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title(), Some("alpha"));
    }

    #[tokio::test]
    async fn test_add_texts_explicit_ids_and_metadata() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store.clone());
        indexer.create_index(false).await;

        let mut payload = Payload::new();
        payload.insert("genre".into(), serde_json::Value::String("xianxia".into()));

        assert!(
            indexer
                .add_texts(
                    &texts(&["alpha"]),
                    Some(vec![PointId::Uuid("doc-1".into())]),
                    Some(vec![payload.clone()]),
                )
                .await
        );

        let results = indexer.search("alpha", 1, 0.0).await;
        assert_eq!(results[0].id, PointId::Uuid("doc-1".into()));
        assert_eq!(results[0].payload, payload);
    }

    #[tokio::test]
    async fn test_add_texts_length_mismatch() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store);
        indexer.create_index(false).await;

        let err = indexer
            .try_add_texts(&texts(&["alpha", "beta"]), Some(vec![PointId::Num(1)]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_add_texts_batch_issues_ceil_n_over_b_writes() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store.clone());
        indexer.create_index(false).await;

        let input = texts(&["alpha", "beta", "gamma", "delta", "epsilon"]);
        assert!(indexer.add_texts_batch(&input, 2).await);

        // ceil(5 / 2) = 3 store writes covering all five points
        assert_eq!(store.upsert_calls(), 3);
        assert_eq!(store.point_count("test_collection").await, 5);

        // Positional integer ids, original order
        let results = indexer.search("gamma", 1, 0.0).await;
        assert_eq!(results[0].id, PointId::Num(2));
        assert_eq!(results[0].title(), Some("gamma"));
    }

    #[tokio::test]
    async fn test_add_texts_batch_two_writes_for_three_texts() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store.clone());
        indexer.create_index(false).await;

        assert!(
            indexer
                .add_texts_batch(&texts(&["alpha", "beta", "gamma"]), 2)
                .await
        );
        assert_eq!(store.upsert_calls(), 2);
    }

    #[tokio::test]
    async fn test_add_texts_batch_fails_fast_keeps_earlier_chunks() {
        let inner = Arc::new(InMemoryStore::new());
        let flaky = Arc::new(FlakyStore {
            inner: inner.clone(),
            allowed: 1,
            seen: AtomicUsize::new(0),
        });
        let indexer = indexer_with_store(flaky);
        indexer.create_index(false).await;

        let input = texts(&["alpha", "beta", "gamma", "delta", "epsilon"]);
        assert!(!indexer.add_texts_batch(&input, 2).await);

        // First chunk committed, nothing after the failure
        assert_eq!(inner.point_count("test_collection").await, 2);
    }

    #[tokio::test]
    async fn test_search_matches_search_by_vector() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store);
        indexer.create_index(false).await;
        indexer
            .add_texts(&texts(&["alpha", "beta", "gamma"]), None, None)
            .await;

        let by_text = indexer.search("beta", 3, 0.0).await;
        let by_vector = indexer.search_by_vector(fake_vector("beta"), 3, 0.0).await;

        assert_eq!(by_text.len(), by_vector.len());
        for (a, b) in by_text.iter().zip(&by_vector) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.score, b.score);
            assert_eq!(a.payload, b.payload);
        }
    }

    #[tokio::test]
    async fn test_search_batch_preserves_input_order() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store);
        indexer.create_index(false).await;
        indexer
            .add_texts(&texts(&["alpha", "beta", "gamma", "delta"]), None, None)
            .await;

        let queries = texts(&["beta", "alpha", "delta"]);
        for batch_size in [0, 1, 2, 10] {
            let results = indexer.search_batch(&queries, 1, 0.5, batch_size).await;
            assert_eq!(results.len(), queries.len());
            assert_eq!(results[0][0].title(), Some("beta"));
            assert_eq!(results[1][0].title(), Some("alpha"));
            assert_eq!(results[2][0].title(), Some("delta"));
        }
    }

    #[tokio::test]
    async fn test_search_batch_embedding_failure_empties_call() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = TextIndexer::new(Arc::new(BrokenEmbedder), store, "test_collection");

        let results = indexer.search_batch(&texts(&["alpha"]), 3, 0.0, 2).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_high_threshold_is_empty_not_error() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store);
        indexer.create_index(false).await;
        indexer.add_texts(&texts(&["beta"]), None, None).await;

        // "alpha" is orthogonal to everything stored
        let results = indexer.try_search("alpha", 10, 0.99).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_payload_round_trip() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store);
        indexer.create_index(false).await;

        let mut payload = Payload::new();
        payload.insert("title".into(), serde_json::Value::String("alpha".into()));
        payload.insert("chapter".into(), serde_json::Value::Number(12.into()));
        indexer
            .add_texts(&texts(&["alpha"]), None, Some(vec![payload.clone()]))
            .await;

        let results = indexer.search("alpha", 1, 0.0).await;
        assert_eq!(results[0].payload, payload);
    }

    #[tokio::test]
    async fn test_add_vectors() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store.clone());
        indexer.create_index(false).await;

        let vectors = vec![fake_vector("alpha"), fake_vector("beta")];
        assert!(indexer.add_vectors(vectors, &texts(&["alpha", "beta"])).await);
        assert_eq!(store.point_count("test_collection").await, 2);

        assert!(
            !indexer
                .add_vectors(vec![fake_vector("alpha")], &texts(&["alpha", "beta"]))
                .await
        );
    }

    #[tokio::test]
    async fn test_concurrent_search_batch_calls() {
        let store = Arc::new(InMemoryStore::new());
        let indexer = indexer_with_store(store);
        indexer.create_index(false).await;
        indexer
            .add_texts(&texts(&["alpha", "beta", "gamma"]), None, None)
            .await;

        let queries = texts(&["alpha", "beta", "gamma"]);
        let (a, b, c) = tokio::join!(
            indexer.search_batch(&queries, 1, 0.5, 2),
            indexer.search_batch(&queries, 1, 0.5, 2),
            indexer.search_batch(&queries, 1, 0.5, 2),
        );

        for results in [a, b, c] {
            assert_eq!(results.len(), 3);
            assert_eq!(results[0][0].title(), Some("alpha"));
            assert_eq!(results[2][0].title(), Some("gamma"));
        }
    }
}
