//! Semantic text indexing and retrieval pipeline over Qdrant.
//!
//! The pipeline turns text into vectors through an injected
//! [`Embedder`], stores them as payload-carrying points in a named
//! collection, and retrieves nearest neighbors by cosine similarity.
//! [`TextIndexer`] is the async entry point; [`blocking::TextIndexer`]
//! wraps it for synchronous callers.

pub mod blocking;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{ConfigError, EmbeddingError, IndexError, StoreError};
pub use models::{Config, Payload, Point, PointId, SearchResult};
pub use services::{Embedder, HttpEmbedder, InMemoryStore, QdrantStore, TextIndexer, VectorStore};
