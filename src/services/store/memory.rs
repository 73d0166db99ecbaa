//! In-process vector store backend.
//!
//! Implements the same contract as the remote backend with real cosine
//! scoring, which makes it useful for offline development and for exercising
//! the pipeline without a running Qdrant instance.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::VectorStore;
use crate::error::StoreError;
use crate::models::{Payload, Point, PointId, SearchResult};

struct StoredPoint {
    vector: Vec<f32>,
    payload: Payload,
}

struct MemCollection {
    vector_size: u64,
    points: HashMap<PointId, StoredPoint>,
}

/// In-memory vector store with upsert-by-id semantics and cosine ranking.
///
/// Call counters track how many upsert and query requests were issued,
/// mirroring what a remote store would have received.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, MemCollection>>,
    upsert_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of upsert requests issued so far.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Number of query requests issued so far.
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Number of points currently stored in a collection.
    pub async fn point_count(&self, name: &str) -> usize {
        self.collections
            .read()
            .await
            .get(name)
            .map_or(0, |c| c.points.len())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        collections.insert(
            name.to_string(),
            MemCollection {
                vector_size,
                points: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if collections.remove(name).is_none() {
            return Err(StoreError::CollectionNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn upsert_points(&self, name: &str, points: Vec<Point>) -> Result<(), StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        // Validate up front so the write stays all-or-nothing
        for point in &points {
            if point.vector.len() as u64 != collection.vector_size {
                return Err(StoreError::UpsertError(format!(
                    "vector dimension {} does not match collection dimension {}",
                    point.vector.len(),
                    collection.vector_size
                )));
            }
        }

        for point in points {
            collection.points.insert(
                point.id,
                StoredPoint {
                    vector: point.vector,
                    payload: point.payload,
                },
            );
        }
        Ok(())
    }

    async fn query(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, StoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);

        let collections = self.collections.read().await;
        let collection = collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        if vector.len() as u64 != collection.vector_size {
            return Err(StoreError::SearchError(format!(
                "query vector dimension {} does not match collection dimension {}",
                vector.len(),
                collection.vector_size
            )));
        }

        let mut results: Vec<SearchResult> = collection
            .points
            .iter()
            .map(|(id, stored)| SearchResult {
                id: id.clone(),
                score: cosine_similarity(&vector, &stored.vector),
                payload: stored.payload.clone(),
            })
            .filter(|r| r.score >= score_threshold)
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit as usize);
        Ok(results)
    }
}
