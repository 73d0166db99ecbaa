//! Embedding provider boundary: text to fixed-length vectors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Capability interface over interchangeable embedding backends.
///
/// Implementations convert an ordered sequence of texts into one
/// fixed-length vector per text, in the same order, and expose their output
/// dimensionality. The concrete backend is chosen at construction time and
/// injected into the pipeline.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Output vector dimensionality, queried once at collection creation.
    fn dimension(&self) -> u64;

    /// Embed all texts in a single call.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// L2-normalize a vector in place. A zero vector is left unchanged.
pub fn normalize_vector(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Request body for the /embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest {
    inputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
}

/// Response from the /embed endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Health response from the /health endpoint.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

/// Embedder backed by a remote HTTP embedding server.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    dimension: u64,
    normalize: bool,
}

impl HttpEmbedder {
    /// Create a new embedder from the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            dimension: config.dimension,
            normalize: config.normalize,
        })
    }

    /// Create an embedder with default configuration.
    pub fn with_defaults() -> Result<Self, EmbeddingError> {
        Self::new(&EmbeddingConfig::default())
    }

    /// Check if the embedding server is healthy and ready.
    pub async fn health_check(&self) -> Result<HealthResponse, EmbeddingError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ServerError(format!(
                "health check failed with status: {}",
                response.status()
            )));
        }

        // Server may return an empty body on health check
        let text = response.text().await.unwrap_or_default();
        if text.is_empty() {
            return Ok(HealthResponse {
                status: Some("healthy".to_string()),
                model_id: None,
            });
        }

        serde_json::from_str(&text).map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))
    }

    /// Get the base URL of the embedding server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimension(&self) -> u64 {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest {
            inputs: texts.to_vec(),
            truncate: Some(true),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let mut embeddings = embed_response.0;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        if self.normalize {
            for vector in &mut embeddings {
                normalize_vector(vector);
            }
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let config = EmbeddingConfig::default();
        let embedder = HttpEmbedder::new(&config);
        assert!(embedder.is_ok());
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: "http://localhost:11411/".to_string(),
            ..Default::default()
        };
        let embedder = HttpEmbedder::new(&config).unwrap();
        assert_eq!(embedder.base_url(), "http://localhost:11411");
    }

    #[test]
    fn test_normalize_vector() {
        let mut v = vec![3.0, 4.0];
        normalize_vector(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        normalize_vector(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
