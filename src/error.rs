//! Error types for the indexing and retrieval pipeline.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            // Server errors might be transient (e.g., 503 Service Unavailable)
            EmbeddingError::ServerError(msg) => {
                msg.contains("503")
                    || msg.contains("502")
                    || msg.contains("504")
                    || msg.contains("429")
                    || msg.to_lowercase().contains("unavailable")
                    || msg.to_lowercase().contains("too many requests")
            }
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to vector store operations.
///
/// Store-semantic failures ("already exists", "not found") get their own
/// variants so callers can tell them apart from transport failures; the
/// sentinel surface in [`crate::services::TextIndexer`] collapses them back
/// into booleans and empty lists.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection '{0}' already exists")]
    CollectionExists(String),

    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("store client error: {0}")]
    ClientError(String),
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        match self {
            StoreError::ConnectionError(_) => true,
            // Semantic rejections fail the same way every time
            StoreError::CollectionExists(_) | StoreError::CollectionNotFound(_) => false,
            StoreError::CollectionError(msg)
            | StoreError::UpsertError(msg)
            | StoreError::SearchError(msg)
            | StoreError::ClientError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
            }
        }
    }
}

/// Errors related to indexing and search pipeline operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_retryable() {
        assert!(StoreError::ConnectionError("refused".into()).is_retryable());
        assert!(StoreError::SearchError("request timeout".into()).is_retryable());
        assert!(!StoreError::CollectionExists("docs".into()).is_retryable());
        assert!(!StoreError::CollectionNotFound("docs".into()).is_retryable());
        assert!(!StoreError::UpsertError("dimension mismatch".into()).is_retryable());
    }

    #[test]
    fn test_embedding_error_retryable() {
        assert!(EmbeddingError::Timeout.is_retryable());
        assert!(EmbeddingError::ServerError("status 503".into()).is_retryable());
        assert!(!EmbeddingError::InvalidResponse("not json".into()).is_retryable());
    }
}
