//! Point model: one stored (id, vector, payload) record.

use serde::{Deserialize, Serialize};

/// Arbitrary JSON-like metadata attached to a point.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Point identifier, unique within a collection.
///
/// The store accepts both numeric and string (UUID-style) identifiers, so
/// both are representable here. Serialized untagged: a number stays a
/// number, a string stays a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl From<u64> for PointId {
    fn from(id: u64) -> Self {
        PointId::Num(id)
    }
}

impl From<String> for PointId {
    fn from(id: String) -> Self {
        PointId::Uuid(id)
    }
}

impl From<&str> for PointId {
    fn from(id: &str) -> Self {
        PointId::Uuid(id.to_string())
    }
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Uuid(s) => write!(f, "{}", s),
        }
    }
}

/// One indexed item: identifier, embedding vector and payload metadata.
///
/// The vector length must equal the dimensionality the target collection was
/// created with; a mismatch is rejected by the store at upsert time, not
/// validated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub payload: Payload,
}

impl Point {
    /// Create a point with an empty payload.
    pub fn new(id: impl Into<PointId>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            payload: Payload::new(),
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Create a point carrying the conventional `{"title": text}` payload.
    pub fn titled(id: impl Into<PointId>, vector: Vec<f32>, title: &str) -> Self {
        let mut payload = Payload::new();
        payload.insert("title".to_string(), serde_json::Value::String(title.to_string()));
        Self {
            id: id.into(),
            vector,
            payload,
        }
    }
}
