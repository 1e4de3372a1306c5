//! Generation-backed synthesis

use crate::error::SynthesisError;
use crate::prompt::PromptBuilder;
use pipelens_domain::traits::{GenerationBackend, GenerationRequest};
use pipelens_domain::{GeneratedAnswer, Match};
use pipelens_llm::extract_response;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default output token budget
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Default bound on one generation call (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Asks a generation backend for an answer grounded in the matches
#[derive(Debug, Clone)]
pub struct GeneratedSynthesizer<G> {
    backend: G,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl<G> GeneratedSynthesizer<G>
where
    G: GenerationBackend,
{
    /// Create a synthesizer with default sampling settings
    pub fn new(backend: G) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Bound each generation call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the output token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The backend prompts are sent to
    pub fn backend(&self) -> &G {
        &self.backend
    }

    /// Generate with the configured sampling settings
    pub async fn generate(
        &self,
        question: &str,
        matches: &[Match],
    ) -> Result<GeneratedAnswer, SynthesisError> {
        self.synthesize_generated(question, matches, self.max_tokens, self.temperature)
            .await
    }

    /// Build the grounded prompt, call the backend, and extract the answer
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::GenerationUnavailable`] when the backend
    /// fails, exceeds the timeout, or replies only with error documents.
    pub async fn synthesize_generated(
        &self,
        question: &str,
        matches: &[Match],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<GeneratedAnswer, SynthesisError> {
        let prompt = PromptBuilder::new(question, matches).build();
        debug!("Prompt length: {} chars", prompt.len());

        let request = GenerationRequest {
            prompt,
            temperature,
            max_tokens,
        };

        let raw = timeout(self.timeout, self.backend.generate(&request))
            .await
            .map_err(|_| {
                SynthesisError::GenerationUnavailable(format!(
                    "{} did not answer within {:?}",
                    self.backend.describe(),
                    self.timeout
                ))
            })?
            .map_err(|e| SynthesisError::GenerationUnavailable(e.to_string()))?;

        let answer = extract_response(&raw)
            .map_err(|e| SynthesisError::GenerationUnavailable(e.to_string()))?;

        info!(
            "Generated answer of {} chars from {} matches",
            answer.len(),
            matches.len()
        );

        Ok(GeneratedAnswer {
            answer,
            prompt: request.prompt,
        })
    }
}
