//! Qdrant vector store backend.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, ListValue, PointStruct, SearchPointsBuilder, Struct,
    UpsertPointsBuilder, Value, VectorParamsBuilder, value::Kind,
};
use std::collections::HashMap;
use tracing::debug;

use super::VectorStore;
use crate::error::StoreError;
use crate::models::{Payload, Point, PointId, SearchResult, StoreConfig};

/// Vector store backend talking to a remote Qdrant instance over gRPC.
pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    /// Connect using the given configuration.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut builder = Qdrant::from_url(&config.url());

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        Ok(Self { client })
    }

    /// Connect with default configuration.
    pub fn with_defaults() -> Result<Self, StoreError> {
        Self::new(&StoreConfig::default())
    }

    /// Check if the store is healthy and accessible.
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| StoreError::ConnectionError(e.to_string()))
    }
}

fn is_not_found(msg: &str) -> bool {
    msg.contains("not found") || msg.contains("doesn't exist") || msg.contains("does not exist")
}

fn json_to_value(value: serde_json::Value) -> Value {
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Kind::IntegerValue(i)
            } else {
                Kind::DoubleValue(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        }),
    };
    Value { kind: Some(kind) }
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(fields)) => serde_json::Value::Object(
            fields
                .fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

fn payload_to_qdrant(payload: Payload) -> HashMap<String, Value> {
    payload
        .into_iter()
        .map(|(k, v)| (k, json_to_value(v)))
        .collect()
}

fn payload_from_qdrant(payload: HashMap<String, Value>) -> Payload {
    payload
        .into_iter()
        .map(|(k, v)| (k, value_to_json(v)))
        .collect()
}

fn point_to_struct(point: Point) -> PointStruct {
    let payload = payload_to_qdrant(point.payload);
    match point.id {
        PointId::Num(n) => PointStruct::new(n, point.vector, payload),
        PointId::Uuid(s) => PointStruct::new(s, point.vector, payload),
    }
}

fn scored_point_id(id: qdrant_client::qdrant::PointId) -> Option<PointId> {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match id.point_id_options {
        Some(PointIdOptions::Num(n)) => Some(PointId::Num(n)),
        Some(PointIdOptions::Uuid(u)) => Some(PointId::Uuid(u)),
        None => None,
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), StoreError> {
        let request = CreateCollectionBuilder::new(name)
            .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine));

        self.client.create_collection(request).await.map_err(|e| {
            let msg = e.to_string();
            if msg.contains("already exists") {
                StoreError::CollectionExists(name.to_string())
            } else {
                StoreError::CollectionError(msg)
            }
        })?;

        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        self.client.delete_collection(name).await.map_err(|e| {
            let msg = e.to_string();
            if is_not_found(&msg) {
                StoreError::CollectionNotFound(name.to_string())
            } else {
                StoreError::CollectionError(msg)
            }
        })?;

        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        self.client
            .collection_exists(name)
            .await
            .map_err(|e| StoreError::ClientError(e.to_string()))
    }

    async fn upsert_points(&self, name: &str, points: Vec<Point>) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = points.into_iter().map(point_to_struct).collect();
        let upsert = UpsertPointsBuilder::new(name, points).wait(true);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| StoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let request = SearchPointsBuilder::new(name, vector, limit)
            .with_payload(true)
            .score_threshold(score_threshold);

        let response = self.client.search_points(request).await.map_err(|e| {
            let msg = e.to_string();
            if is_not_found(&msg) {
                StoreError::CollectionNotFound(name.to_string())
            } else {
                StoreError::SearchError(msg)
            }
        })?;

        let results = response
            .result
            .into_iter()
            .filter_map(|point| {
                let id = match point.id.and_then(scored_point_id) {
                    Some(id) => id,
                    None => {
                        // A reply without a point id is malformed; skip it
                        debug!(collection = name, "dropping search hit without point id");
                        return None;
                    }
                };
                Some(SearchResult {
                    id,
                    score: point.score,
                    payload: payload_from_qdrant(point.payload),
                })
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_value_roundtrip() {
        let original = serde_json::json!({
            "title": "novel",
            "rank": 3,
            "score": 0.75,
            "tags": ["fantasy", "urban"],
            "nested": {"flag": true, "note": null}
        });

        let roundtripped = value_to_json(json_to_value(original.clone()));
        assert_eq!(roundtripped, original);
    }

    #[test]
    fn test_payload_conversion() {
        let mut payload = Payload::new();
        payload.insert("title".into(), serde_json::Value::String("abc".into()));
        payload.insert("count".into(), serde_json::Value::Number(5.into()));

        let qdrant = payload_to_qdrant(payload.clone());
        assert_eq!(qdrant.len(), 2);
        assert_eq!(payload_from_qdrant(qdrant), payload);
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found("Collection `docs` doesn't exist"));
        assert!(is_not_found("collection not found"));
        assert!(!is_not_found("connection refused"));
    }

    #[test]
    fn test_store_creation() {
        let config = StoreConfig {
            https: false,
            ..Default::default()
        };
        assert!(QdrantStore::new(&config).is_ok());
    }
}
