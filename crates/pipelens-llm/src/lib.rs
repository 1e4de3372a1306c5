//! Pipelens Generation Layer
//!
//! Generation backends, the reply extractor, and a remote embedding model.
//!
//! # Architecture
//!
//! This crate provides implementations of the `GenerationBackend` and
//! `EmbeddingModel` traits from `pipelens-domain`. Backends return the raw
//! reply body; [`extract_response`] turns it into answer text.
//!
//! # Backends
//!
//! - `MockBackend`: Deterministic canned replies for testing
//! - `OllamaBackend`: Ollama `/api/generate`, streamed or not
//! - `OllamaEmbeddingModel`: Ollama `/api/embeddings`
//!
//! # Examples
//!
//! ```
//! use pipelens_llm::{extract_response, MockBackend};
//! use pipelens_domain::traits::{GenerationBackend, GenerationRequest};
//!
//! # tokio_test::block_on(async {
//! let backend = MockBackend::answering("Root cause: flaky test");
//! let request = GenerationRequest {
//!     prompt: "why?".to_string(),
//!     temperature: 0.1,
//!     max_tokens: 64,
//! };
//! let raw = backend.generate(&request).await.unwrap();
//! assert_eq!(extract_response(&raw).unwrap(), "Root cause: flaky test");
//! # });
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod ollama;
pub mod response;

use async_trait::async_trait;
use pipelens_domain::traits::{GenerationBackend, GenerationRequest};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use embedding::OllamaEmbeddingModel;
pub use ollama::OllamaBackend;
pub use response::{extract_response, ExtractError, StreamAccumulator};

/// Errors that can occur while talking to a generation or embedding service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The service did not answer within the configured time
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid response from the service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether the error means the service could not be reached or used
    ///
    /// These are the failures callers fall back from.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_)
                | LlmError::Timeout(_)
                | LlmError::RateLimitExceeded
                | LlmError::ModelNotAvailable(_)
        )
    }
}

/// Mock generation backend for deterministic testing
///
/// Replies with pre-configured raw bodies without making any network calls.
/// Clones share their call counter and configured replies.
///
/// # Examples
///
/// ```
/// use pipelens_llm::MockBackend;
/// use pipelens_domain::traits::{GenerationBackend, GenerationRequest};
///
/// # tokio_test::block_on(async {
/// let backend = MockBackend::new("{\"response\":\"a\"}\n{\"response\":\"b\"}");
/// backend.add_reply("special", "{\"response\":\"c\"}");
///
/// let request = |p: &str| GenerationRequest { prompt: p.to_string(), temperature: 0.0, max_tokens: 8 };
/// assert_eq!(backend.generate(&request("any")).await.unwrap(), "{\"response\":\"a\"}\n{\"response\":\"b\"}");
/// assert_eq!(backend.generate(&request("special")).await.unwrap(), "{\"response\":\"c\"}");
/// assert_eq!(backend.call_count(), 2);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    default_reply: String,
    replies: Arc<Mutex<HashMap<String, Result<String, LlmError>>>>,
    failure: Option<LlmError>,
    delay: Option<Duration>,
    call_count: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<GenerationRequest>>>,
}

impl MockBackend {
    /// Create a backend that replies with the raw body `reply` to every prompt
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            default_reply: reply.into(),
            replies: Arc::new(Mutex::new(HashMap::new())),
            failure: None,
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a backend whose reply is a single `{"response": text}` document
    pub fn answering(text: &str) -> Self {
        Self::new(serde_json::json!({ "response": text, "done": true }).to_string())
    }

    /// Create a backend that fails every call with `error`
    pub fn failing(error: LlmError) -> Self {
        let mut backend = Self::new("");
        backend.failure = Some(error);
        backend
    }

    /// Wait `delay` before replying
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific raw reply for a given prompt
    pub fn add_reply(&self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(prompt.into(), Ok(reply.into()));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&self, prompt: impl Into<String>, error: LlmError) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(prompt.into(), Err(error));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The most recent request received
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::answering("Default mock response")
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    type Error = LlmError;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, Self::Error> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let configured = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&request.prompt)
            .cloned();

        configured.unwrap_or_else(|| Ok(self.default_reply.clone()))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            temperature: 0.1,
            max_tokens: 32,
        }
    }

    #[tokio::test]
    async fn test_mock_backend_default() {
        let backend = MockBackend::new("raw body");
        assert_eq!(backend.generate(&request("any prompt")).await.unwrap(), "raw body");
    }

    #[tokio::test]
    async fn test_mock_backend_answering_is_extractable() {
        let backend = MockBackend::answering("  The test suite timed out.  ");
        let raw = backend.generate(&request("q")).await.unwrap();
        assert_eq!(extract_response(&raw).unwrap(), "The test suite timed out.");
    }

    #[tokio::test]
    async fn test_mock_backend_specific_replies() {
        let backend = MockBackend::new("default");
        backend.add_reply("hello", "world");
        backend.add_error("bad prompt", LlmError::Other("Mock error".to_string()));

        assert_eq!(backend.generate(&request("hello")).await.unwrap(), "world");
        assert_eq!(backend.generate(&request("unknown")).await.unwrap(), "default");
        assert!(matches!(
            backend.generate(&request("bad prompt")).await,
            Err(LlmError::Other(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_backend_failing() {
        let backend = MockBackend::failing(LlmError::Communication("refused".to_string()));
        let err = backend.generate(&request("q")).await.unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_backend_records_last_request() {
        let backend = MockBackend::default();
        assert!(backend.last_request().is_none());

        backend.generate(&request("first")).await.unwrap();
        backend.generate(&request("second")).await.unwrap();
        assert_eq!(backend.last_request().unwrap().prompt, "second");
    }

    #[tokio::test]
    async fn test_mock_backend_clone_shares_state() {
        let backend1 = MockBackend::new("test");
        let backend2 = backend1.clone();

        backend1.generate(&request("test")).await.unwrap();

        assert_eq!(backend1.call_count(), 1);
        assert_eq!(backend2.call_count(), 1);
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(LlmError::Timeout(5).is_unavailable());
        assert!(LlmError::ModelNotAvailable("llama3.1".to_string()).is_unavailable());
        assert!(LlmError::RateLimitExceeded.is_unavailable());
        assert!(!LlmError::InvalidResponse("bad".to_string()).is_unavailable());
        assert!(!LlmError::Other("x".to_string()).is_unavailable());
    }
}
