//! Data model types shared across the pipeline.

mod config;
mod point;
mod search;

pub use config::{
    Config, DEFAULT_EMBEDDING_DIM, DEFAULT_EMBEDDING_URL, DEFAULT_STORE_HOST, DEFAULT_STORE_PORT,
    EmbeddingConfig, IndexingConfig, StoreConfig,
};
pub use point::{Payload, Point, PointId};
pub use search::{DEFAULT_LIMIT, DEFAULT_SCORE_THRESHOLD, SearchResult};
