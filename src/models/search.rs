//! Search result models.

use serde::{Deserialize, Serialize};

use super::point::{Payload, PointId};

/// Default number of results returned per query.
pub const DEFAULT_LIMIT: u64 = 10;

/// Default minimum similarity a match must reach to be returned.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.0;

/// A single ranked match returned by a query.
///
/// The identifier is always populated: a store reply that omits the point id
/// is treated as malformed and dropped by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Identifier of the matched point.
    pub id: PointId,

    /// Cosine similarity score; higher is more similar.
    pub score: f32,

    /// Copy of the matched point's payload.
    pub payload: Payload,
}

impl SearchResult {
    pub fn new(id: impl Into<PointId>, score: f32, payload: Payload) -> Self {
        Self {
            id: id.into(),
            score,
            payload,
        }
    }

    /// Convenience accessor for the conventional `title` payload field.
    pub fn title(&self) -> Option<&str> {
        self.payload.get("title").and_then(|v| v.as_str())
    }
}
