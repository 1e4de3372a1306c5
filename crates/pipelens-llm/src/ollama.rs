//! Ollama Backend Implementation
//!
//! Sends prompts to Ollama's `/api/generate` endpoint.
//!
//! # Features
//!
//! - Streamed (NDJSON) or single-document replies, returned raw
//! - Configurable endpoint, model and timeout
//! - Bounded retries with exponential backoff on transport failures
//!
//! # Examples
//!
//! ```no_run
//! use pipelens_llm::OllamaBackend;
//! use std::time::Duration;
//!
//! let backend = OllamaBackend::new("http://localhost:11434", "llama3.1", Duration::from_secs(60))
//!     .unwrap()
//!     .with_stream(false);
//! ```

use crate::LlmError;
use async_trait::async_trait;
use pipelens_domain::traits::{GenerationBackend, GenerationRequest};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Default number of attempts (no retry)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

const GENERATE_PATH: &str = "/api/generate";

/// Ollama API backend for local generation
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    endpoint: String,
    model: String,
    stream: bool,
    timeout: Duration,
    max_attempts: u32,
    client: reqwest::Client,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// `endpoint` is either the server root (`http://localhost:11434`) or the
    /// full generate URL. Replies are streamed by default.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Other`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            stream: true,
            timeout,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            client,
        })
    }

    /// Ask for a streamed (NDJSON) or single-document reply
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the maximum number of attempts per call (at least one)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Model name sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full URL of the generate endpoint
    pub fn generate_url(&self) -> String {
        if self.endpoint.ends_with(GENERATE_PATH) {
            self.endpoint.clone()
        } else {
            format!("{}{}", self.endpoint, GENERATE_PATH)
        }
    }

    async fn attempt(&self, url: &str, body: &OllamaGenerateRequest<'_>) -> Result<String, LlmError> {
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout.as_secs())
            } else {
                LlmError::Communication(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout.as_secs())
            } else {
                LlmError::InvalidResponse(format!("Failed to read reply body: {}", e))
            }
        })
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    type Error = LlmError;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, Self::Error> {
        let url = self.generate_url();
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: self.stream,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(&url, &body).await {
                Ok(raw) => {
                    debug!("Ollama replied with {} bytes", raw.len());
                    return Ok(raw);
                }
                Err(e @ (LlmError::Communication(_) | LlmError::Timeout(_)))
                    if attempts < self.max_attempts =>
                {
                    warn!("Ollama attempt {} failed: {}", attempts, e);
                    // Exponential backoff: 1s, 2s, 4s, etc.
                    let delay = Duration::from_secs(2u64.pow(attempts - 1));
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn describe(&self) -> String {
        format!("ollama ({} at {})", self.model, self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(endpoint: &str) -> OllamaBackend {
        OllamaBackend::new(endpoint, "llama3.1", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_ollama_backend_creation() {
        let backend = backend("http://localhost:11434/");
        assert_eq!(backend.endpoint, "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.1");
        assert!(backend.stream);
        assert_eq!(backend.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_generate_url() {
        assert_eq!(
            backend("http://localhost:11434").generate_url(),
            "http://localhost:11434/api/generate"
        );
        assert_eq!(
            backend("http://ollama:11434/api/generate").generate_url(),
            "http://ollama:11434/api/generate"
        );
    }

    #[test]
    fn test_max_attempts_at_least_one() {
        assert_eq!(backend(DEFAULT_ENDPOINT).with_max_attempts(0).max_attempts, 1);
        assert_eq!(backend(DEFAULT_ENDPOINT).with_max_attempts(3).max_attempts, 3);
    }

    #[test]
    fn test_request_body_shape() {
        let body = OllamaGenerateRequest {
            model: "llama3.1",
            prompt: "p",
            stream: true,
            options: OllamaOptions {
                temperature: 0.5,
                num_predict: 512,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["stream"], true);
        assert_eq!(value["options"]["num_predict"], 512);
        assert_eq!(value["options"]["temperature"], 0.5);
    }

    #[tokio::test]
    async fn test_ollama_error_handling() {
        // Nothing listens on the discard port
        let backend = backend("http://127.0.0.1:9");
        let request = GenerationRequest {
            prompt: "test".to_string(),
            temperature: 0.1,
            max_tokens: 8,
        };

        let err = backend.generate(&request).await.unwrap_err();
        assert!(matches!(err, LlmError::Communication(_)));
        assert!(err.is_unavailable());
    }
}
