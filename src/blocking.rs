//! Blocking facade over the async pipeline.
//!
//! Wraps [`crate::services::TextIndexer`] with an owned runtime so that
//! synchronous callers get the sequential execution mode: every call blocks
//! until the store has responded. Must not be used from inside an async
//! context; use the async indexer there instead.

use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::error::IndexError;
use crate::models::{Config, Payload, PointId, SearchResult};
use crate::services::{Embedder, VectorStore};

/// Synchronous text indexing and search pipeline.
pub struct TextIndexer {
    inner: crate::services::TextIndexer,
    runtime: Runtime,
}

impl TextIndexer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Result<Self, std::io::Error> {
        Ok(Self {
            inner: crate::services::TextIndexer::new(embedder, store, collection),
            runtime: Runtime::new()?,
        })
    }

    /// Build a blocking indexer from configuration: HTTP embedder plus
    /// remote Qdrant backend.
    pub fn connect(config: &Config, collection: impl Into<String>) -> Result<Self, IndexError> {
        let inner = crate::services::TextIndexer::connect(config, collection)?;
        let runtime = Runtime::new()
            .map_err(|e| IndexError::InvalidInput(format!("failed to start runtime: {}", e)))?;
        Ok(Self { inner, runtime })
    }

    pub fn collection(&self) -> &str {
        self.inner.collection()
    }

    pub fn try_create_index(&self, force: bool) -> Result<(), IndexError> {
        self.runtime.block_on(self.inner.try_create_index(force))
    }

    pub fn create_index(&self, force: bool) -> bool {
        self.runtime.block_on(self.inner.create_index(force))
    }

    pub fn try_add_texts(
        &self,
        texts: &[String],
        ids: Option<Vec<PointId>>,
        metadata: Option<Vec<Payload>>,
    ) -> Result<(), IndexError> {
        self.runtime
            .block_on(self.inner.try_add_texts(texts, ids, metadata))
    }

    pub fn add_texts(
        &self,
        texts: &[String],
        ids: Option<Vec<PointId>>,
        metadata: Option<Vec<Payload>>,
    ) -> bool {
        self.runtime
            .block_on(self.inner.add_texts(texts, ids, metadata))
    }

    pub fn try_add_texts_batch(&self, texts: &[String], batch_size: usize) -> Result<(), IndexError> {
        self.runtime
            .block_on(self.inner.try_add_texts_batch(texts, batch_size))
    }

    pub fn add_texts_batch(&self, texts: &[String], batch_size: usize) -> bool {
        self.runtime
            .block_on(self.inner.add_texts_batch(texts, batch_size))
    }

    pub fn try_add_vectors(
        &self,
        vectors: Vec<Vec<f32>>,
        texts: &[String],
    ) -> Result<(), IndexError> {
        self.runtime
            .block_on(self.inner.try_add_vectors(vectors, texts))
    }

    pub fn add_vectors(&self, vectors: Vec<Vec<f32>>, texts: &[String]) -> bool {
        self.runtime
            .block_on(self.inner.add_vectors(vectors, texts))
    }

    pub fn try_search(
        &self,
        query: &str,
        limit: u64,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, IndexError> {
        self.runtime
            .block_on(self.inner.try_search(query, limit, score_threshold))
    }

    pub fn search(&self, query: &str, limit: u64, score_threshold: f32) -> Vec<SearchResult> {
        self.runtime
            .block_on(self.inner.search(query, limit, score_threshold))
    }

    pub fn try_search_by_vector(
        &self,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, IndexError> {
        self.runtime
            .block_on(self.inner.try_search_by_vector(vector, limit, score_threshold))
    }

    pub fn search_by_vector(
        &self,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: f32,
    ) -> Vec<SearchResult> {
        self.runtime
            .block_on(self.inner.search_by_vector(vector, limit, score_threshold))
    }

    pub fn try_search_batch(
        &self,
        queries: &[String],
        limit: u64,
        score_threshold: f32,
        batch_size: usize,
    ) -> Result<Vec<Vec<SearchResult>>, IndexError> {
        self.runtime.block_on(
            self.inner
                .try_search_batch(queries, limit, score_threshold, batch_size),
        )
    }

    pub fn search_batch(
        &self,
        queries: &[String],
        limit: u64,
        score_threshold: f32,
        batch_size: usize,
    ) -> Vec<Vec<SearchResult>> {
        self.runtime.block_on(
            self.inner
                .search_batch(queries, limit, score_threshold, batch_size),
        )
    }
}
