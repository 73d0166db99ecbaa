mod batch;
mod embedding;
mod indexer;
mod store;

pub use batch::batch_ranges;
pub use embedding::{Embedder, HealthResponse, HttpEmbedder, normalize_vector};
pub use indexer::TextIndexer;
pub use store::{InMemoryStore, QdrantStore, VectorStore};
