//! Strategy selection and fallback

use crate::error::SynthesisError;
use crate::generated::GeneratedSynthesizer;
use crate::heuristic::HeuristicSynthesizer;
use async_trait::async_trait;
use pipelens_domain::traits::GenerationBackend;
use pipelens_domain::{EvidenceSummary, Match, SynthesizedAnswer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Which synthesis strategy answers a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Deterministic rules over the evidence
    #[default]
    Heuristic,
    /// Generation backend only
    Generated,
    /// Generation first, heuristic when generation is unavailable
    Auto,
}

impl Strategy {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Heuristic => "heuristic",
            Strategy::Generated => "generated",
            Strategy::Auto => "auto",
        }
    }

    /// Whether this strategy calls a generation backend
    pub fn needs_backend(&self) -> bool {
        !matches!(self, Strategy::Heuristic)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" => Ok(Strategy::Heuristic),
            "generated" | "generation" => Ok(Strategy::Generated),
            "auto" => Ok(Strategy::Auto),
            other => Err(format!(
                "Unknown strategy '{}' (expected heuristic, generated or auto)",
                other
            )),
        }
    }
}

/// A synthesized answer together with its evidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synthesis {
    /// Answer text
    pub answer: String,
    /// Prompt sent to the backend, for generated answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Structured answer, for heuristic answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<SynthesizedAnswer>,
    /// The evidence the answer was drawn from
    pub evidence: EvidenceSummary,
    /// Strategy that produced the answer
    pub strategy: Strategy,
}

/// Common interface of the synthesis strategies
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    /// Answer `question` from ranked `matches`
    async fn synthesize(&self, question: &str, matches: &[Match]) -> Result<Synthesis, SynthesisError>;
}

#[async_trait]
impl AnswerSynthesizer for HeuristicSynthesizer {
    async fn synthesize(&self, question: &str, matches: &[Match]) -> Result<Synthesis, SynthesisError> {
        let structured = self.synthesize_heuristic(matches);
        Ok(Synthesis {
            answer: structured.render(),
            prompt: None,
            structured: Some(structured),
            evidence: EvidenceSummary::from_matches(question, matches),
            strategy: Strategy::Heuristic,
        })
    }
}

#[async_trait]
impl<G: GenerationBackend> AnswerSynthesizer for GeneratedSynthesizer<G> {
    async fn synthesize(&self, question: &str, matches: &[Match]) -> Result<Synthesis, SynthesisError> {
        let generated = self.generate(question, matches).await?;
        Ok(Synthesis {
            answer: generated.answer,
            prompt: Some(generated.prompt),
            structured: None,
            evidence: EvidenceSummary::from_matches(question, matches),
            strategy: Strategy::Generated,
        })
    }
}

/// Dispatches to the configured strategy
///
/// # Examples
///
/// ```
/// use pipelens_llm::{LlmError, MockBackend};
/// use pipelens_synthesizer::{AnswerSynthesizer, GeneratedSynthesizer, Strategy, Synthesizer};
///
/// # tokio_test::block_on(async {
/// let backend = MockBackend::failing(LlmError::Communication("refused".to_string()));
/// let synthesizer = Synthesizer::new(Strategy::Auto, Some(GeneratedSynthesizer::new(backend))).unwrap();
///
/// // Generation is down, so the heuristic answers
/// let synthesis = synthesizer.synthesize("why?", &[]).await.unwrap();
/// assert_eq!(synthesis.strategy, Strategy::Heuristic);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Synthesizer<G> {
    strategy: Strategy,
    heuristic: HeuristicSynthesizer,
    generated: Option<GeneratedSynthesizer<G>>,
}

impl<G: GenerationBackend> Synthesizer<G> {
    /// Create a synthesizer for `strategy`
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::Config`] when the strategy needs a
    /// generation backend and none is given.
    pub fn new(
        strategy: Strategy,
        generated: Option<GeneratedSynthesizer<G>>,
    ) -> Result<Self, SynthesisError> {
        if strategy.needs_backend() && generated.is_none() {
            return Err(SynthesisError::Config(format!(
                "strategy '{}' requires a generation backend",
                strategy
            )));
        }
        Ok(Self {
            strategy,
            heuristic: HeuristicSynthesizer::new(),
            generated,
        })
    }

    /// The configured strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Description of the generation backend, if any
    pub fn backend_description(&self) -> Option<String> {
        self.generated.as_ref().map(|g| g.backend().describe())
    }

    /// Answer with an explicit strategy instead of the configured one
    pub async fn synthesize_with(
        &self,
        strategy: Strategy,
        question: &str,
        matches: &[Match],
    ) -> Result<Synthesis, SynthesisError> {
        let generated = match (strategy, &self.generated) {
            (Strategy::Heuristic, _) => {
                return self.heuristic.synthesize(question, matches).await
            }
            (_, Some(generated)) => generated,
            (_, None) => {
                return Err(SynthesisError::Config(format!(
                    "strategy '{}' requires a generation backend",
                    strategy
                )))
            }
        };

        match generated.synthesize(question, matches).await {
            Err(SynthesisError::GenerationUnavailable(reason)) if strategy == Strategy::Auto => {
                warn!("Generation unavailable, falling back to heuristic: {}", reason);
                self.heuristic.synthesize(question, matches).await
            }
            result => result,
        }
    }
}

#[async_trait]
impl<G: GenerationBackend> AnswerSynthesizer for Synthesizer<G> {
    async fn synthesize(&self, question: &str, matches: &[Match]) -> Result<Synthesis, SynthesisError> {
        self.synthesize_with(self.strategy, question, matches).await
    }
}
