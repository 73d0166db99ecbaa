//! Vector store abstraction layer.
//!
//! This module provides a trait-based abstraction over vector store backends
//! (remote Qdrant, in-process memory) so the indexing pipeline stays
//! backend-agnostic. Every operation is independently safe to retry and
//! holds no cross-call state; no operation retries on its own.

mod memory;
mod qdrant;

pub use memory::InMemoryStore;
pub use qdrant::QdrantStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Point, SearchResult};

/// Store-side collection operations consumed by the indexing pipeline.
///
/// Failures are reported as typed [`StoreError`] values so that semantic
/// outcomes ("already exists", "not found") stay distinguishable from
/// transport failures. The distance metric is fixed to cosine.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection with the given vector dimensionality.
    ///
    /// Fails with [`StoreError::CollectionExists`] if a collection of that
    /// name is already present.
    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), StoreError>;

    /// Delete a collection.
    ///
    /// Fails with [`StoreError::CollectionNotFound`] if it does not exist.
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Check whether a collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Insert or replace points by id. All-or-nothing per call: the store is
    /// asked to wait for completion before returning.
    async fn upsert_points(&self, name: &str, points: Vec<Point>) -> Result<(), StoreError>;

    /// Return the top-`limit` matches with score >= `score_threshold`,
    /// ordered by descending similarity. Every result carries its point id.
    async fn query(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, StoreError>;
}
