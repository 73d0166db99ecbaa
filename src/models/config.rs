use serde::{Deserialize, Serialize};

pub const DEFAULT_STORE_HOST: &str = "localhost";
pub const DEFAULT_STORE_PORT: u16 = 6334;
pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";

/// Default embedding dimension when the provider is not asked.
pub const DEFAULT_EMBEDDING_DIM: u64 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub indexing: IndexingConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("semindex").join("config.toml"))
    }

    pub fn load() -> Result<Self, crate::error::ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from(&path);
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, crate::error::ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), crate::error::ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset. Reads a `.env` file if one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            store: StoreConfig::from_env(),
            embedding: EmbeddingConfig::from_env(),
            indexing: IndexingConfig::default(),
        }
    }
}

/// Connection parameters for the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_host")]
    pub host: String,

    #[serde(default = "default_store_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_https")]
    pub https: bool,
}

fn default_store_host() -> String {
    DEFAULT_STORE_HOST.to_string()
}

fn default_store_port() -> u16 {
    DEFAULT_STORE_PORT
}

fn default_https() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_store_host(),
            port: default_store_port(),
            api_key: None,
            https: default_https(),
        }
    }
}

impl StoreConfig {
    /// Connection URL derived from host, port and TLS flag.
    pub fn url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn from_env() -> Self {
        Self {
            host: std::env::var("QDRANT_HOST").unwrap_or_else(|_| default_store_host()),
            port: std::env::var("QDRANT_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_STORE_PORT),
            api_key: std::env::var("QDRANT_API_KEY").ok(),
            https: std::env::var("QDRANT_HTTPS")
                .ok()
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

/// Connection parameters for the embedding server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_dimension")]
    pub dimension: u64,

    /// L2-normalize vectors returned by the server.
    #[serde(default)]
    pub normalize: bool,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_dimension() -> u64 {
    DEFAULT_EMBEDDING_DIM
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            timeout_secs: default_timeout(),
            dimension: default_dimension(),
            normalize: false,
        }
    }
}

impl EmbeddingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("EMBEDDING_URL").unwrap_or(defaults.url),
            timeout_secs: std::env::var("EMBEDDING_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            dimension: std::env::var("EMBEDDING_DIM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.dimension),
            normalize: std::env::var("EMBEDDING_NORMALIZE")
                .ok()
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Batching parameters for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Maximum points per store write.
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,

    /// Maximum queries per request group in batched search.
    #[serde(default = "default_query_batch_size")]
    pub query_batch_size: usize,
}

fn default_upsert_batch_size() -> usize {
    32
}

fn default_query_batch_size() -> usize {
    10
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            upsert_batch_size: default_upsert_batch_size(),
            query_batch_size: default_query_batch_size(),
        }
    }
}
