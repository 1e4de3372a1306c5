//! Configuration file parsing for the query service.
//!
//! Loads settings from TOML: bind address, retrieval depth, index and
//! embedding backends, generation settings and the answer strategy.
//! `OLLAMA_URL` and `PINECONE_API_KEY` override the file.

use pipelens_ingest::IngestConfig;
use pipelens_synthesizer::Strategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the generation endpoint
pub const OLLAMA_URL_ENV: &str = "OLLAMA_URL";

/// Environment variable supplying the hosted index API key
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Vector index backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum IndexConfig {
    /// In-process index; contents live as long as the process
    Memory,
    /// Hosted Pinecone-compatible index
    Pinecone {
        /// Index host URL
        url: String,
        /// API key (or set `PINECONE_API_KEY`)
        #[serde(default)]
        api_key: Option<String>,
        /// Namespace scoping every operation
        #[serde(default)]
        namespace: Option<String>,
    },
}

impl IndexConfig {
    /// Backend name for logs and health output
    pub fn name(&self) -> &'static str {
        match self {
            IndexConfig::Memory => "memory",
            IndexConfig::Pinecone { .. } => "pinecone",
        }
    }
}

/// Embedding model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum EmbeddingConfig {
    /// Token-hashing embeddings computed in process
    Hash {
        /// Vector dimension
        #[serde(default = "default_dimension")]
        dimension: usize,
    },
    /// Ollama embedding endpoint
    Ollama {
        /// Server root URL
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        /// Embedding model name
        model: String,
        /// Vector dimension the model produces
        dimension: usize,
    },
}

impl EmbeddingConfig {
    /// Dimension of the vectors produced
    pub fn dimension(&self) -> usize {
        match self {
            EmbeddingConfig::Hash { dimension } | EmbeddingConfig::Ollama { dimension, .. } => {
                *dimension
            }
        }
    }
}

/// Generation backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Ollama server root or full generate URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token budget
    pub max_tokens: u32,
    /// Bound on one generation call (seconds)
    pub timeout_secs: u64,
    /// Ask for a streamed (NDJSON) reply
    pub stream: bool,
    /// Attempts per generation call; transport failures are retried
    pub max_attempts: u32,
}

impl GenerationConfig {
    /// The generation timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: pipelens_llm::ollama::DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 512,
            timeout_secs: 60,
            stream: true,
            max_attempts: pipelens_llm::ollama::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Service configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    pub bind_port: u16,

    /// Matches retrieved per question
    pub top_k: usize,

    /// Drop matches scoring below this value
    pub min_score: Option<f64>,

    /// Answer strategy
    pub strategy: Strategy,

    /// Vector index backend
    pub index: IndexConfig,

    /// Embedding backend
    pub embedding: EmbeddingConfig,

    /// Generation backend
    pub generation: GenerationConfig,

    /// Chunking and batching for ingestion
    pub ingest: IngestConfig,
}

fn default_dimension() -> usize {
    pipelens_store::embedding::DEFAULT_DIMENSION
}

fn default_ollama_endpoint() -> String {
    pipelens_llm::ollama::DEFAULT_ENDPOINT.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            top_k: 10,
            min_score: None,
            strategy: Strategy::Heuristic,
            index: IndexConfig::Memory,
            embedding: EmbeddingConfig::Hash {
                dimension: default_dimension(),
            },
            generation: GenerationConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file and apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&contents)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string, without environment overrides
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `OLLAMA_URL` and `PINECONE_API_KEY` from the environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(OLLAMA_URL_ENV).ok(),
            std::env::var(PINECONE_API_KEY_ENV).ok(),
        );
    }

    /// Apply explicit endpoint and API key overrides; blank values are ignored
    pub fn apply_overrides(&mut self, ollama_url: Option<String>, pinecone_api_key: Option<String>) {
        if let Some(url) = ollama_url.filter(|v| !v.trim().is_empty()) {
            self.generation.endpoint = url.clone();
            if let EmbeddingConfig::Ollama { endpoint, .. } = &mut self.embedding {
                *endpoint = url;
            }
        }
        if let Some(key) = pinecone_api_key.filter(|v| !v.trim().is_empty()) {
            if let IndexConfig::Pinecone { api_key, .. } = &mut self.index {
                *api_key = Some(key);
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be greater than 0".to_string()));
        }
        if self.embedding.dimension() == 0 {
            return Err(ConfigError::Invalid(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.generation.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "generation.max_attempts must be greater than 0".to_string(),
            ));
        }
        if let IndexConfig::Pinecone { url, api_key, .. } = &self.index {
            if url.trim().is_empty() {
                return Err(ConfigError::MissingField("index.url".to_string()));
            }
            if api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
                return Err(ConfigError::MissingField(format!(
                    "index.api_key (or {})",
                    PINECONE_API_KEY_ENV
                )));
            }
        }
        self.ingest.validate().map_err(ConfigError::Invalid)
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert_eq!(config.top_k, 10);
        assert_eq!(config.strategy, Strategy::Heuristic);
        assert_eq!(config.index, IndexConfig::Memory);
        assert_eq!(config.generation.model, "llama3.1");
        assert_eq!(config.generation.max_tokens, 512);
        assert!(config.generation.stream);
        assert_eq!(config.generation.max_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            top_k = 5
            min_score = 0.2
            strategy = "auto"

            [index]
            backend = "pinecone"
            url = "https://logs-abc.svc.pinecone.io"
            namespace = "ci"

            [embedding]
            backend = "ollama"
            model = "nomic-embed-text"
            dimension = 768

            [generation]
            model = "mistral"
            timeout_secs = 20
            stream = false
            max_attempts = 3
        "#;

        let config = ServerConfig::from_toml(toml).unwrap();
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.min_score, Some(0.2));
        assert_eq!(config.strategy, Strategy::Auto);
        assert_eq!(config.index.name(), "pinecone");
        assert_eq!(config.embedding.dimension(), 768);
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.generation.temperature, 0.1);
        assert_eq!(config.generation.timeout(), Duration::from_secs(20));
        assert!(!config.generation.stream);
        assert_eq!(config.generation.max_attempts, 3);

        // The key is missing until the environment supplies it
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_overrides() {
        let mut config = ServerConfig {
            index: IndexConfig::Pinecone {
                url: "https://idx".to_string(),
                api_key: None,
                namespace: None,
            },
            embedding: EmbeddingConfig::Ollama {
                endpoint: "http://localhost:11434".to_string(),
                model: "nomic-embed-text".to_string(),
                dimension: 768,
            },
            ..ServerConfig::default()
        };

        config.apply_overrides(Some("http://gpu-box:11434".to_string()), Some("pk-123".to_string()));

        assert_eq!(config.generation.endpoint, "http://gpu-box:11434");
        assert!(matches!(
            &config.embedding,
            EmbeddingConfig::Ollama { endpoint, .. } if endpoint == "http://gpu-box:11434"
        ));
        assert!(matches!(
            &config.index,
            IndexConfig::Pinecone { api_key: Some(key), .. } if key == "pk-123"
        ));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_overrides_ignored() {
        let mut config = ServerConfig::default();
        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config.generation.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_invalid_values() {
        let config = ServerConfig {
            top_k: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ServerConfig::from_toml("[ingest]\nbatch_size = 0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ServerConfig::from_toml("[generation]\nmax_attempts = 0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ServerConfig {
            strategy: Strategy::Generated,
            min_score: Some(0.5),
            ..ServerConfig::default()
        };
        let parsed = ServerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
