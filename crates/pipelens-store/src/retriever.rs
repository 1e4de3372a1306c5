//! Semantic retrieval of log chunks

use crate::normalize::normalize;
use pipelens_domain::traits::{EmbeddingModel, VectorIndex};
use pipelens_domain::{Match, MatchFilter};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during retrieval
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The question could not be embedded
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The index query failed
    #[error("Index error: {0}")]
    Index(String),
}

/// Embeds questions and queries the index for ranked matches
///
/// The embedder must be the one used at ingestion time; the retriever
/// does not check that the two embedding spaces agree.
#[derive(Debug, Clone)]
pub struct Retriever<E, I> {
    embedder: E,
    index: I,
    min_score: f64,
}

impl<E, I> Retriever<E, I>
where
    E: EmbeddingModel,
    I: VectorIndex,
{
    /// Create a retriever with no relevance threshold
    pub fn new(embedder: E, index: I) -> Self {
        Self {
            embedder,
            index,
            min_score: f64::NEG_INFINITY,
        }
    }

    /// Drop matches scoring below `min_score`
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// The index this retriever queries
    pub fn index(&self) -> &I {
        &self.index
    }

    /// The embedder used for questions
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Return at most `top_k` matches for `question`, highest score first
    ///
    /// An empty result (empty index, nothing above the threshold, or
    /// `top_k == 0`) is not an error.
    pub async fn query(
        &self,
        question: &str,
        top_k: usize,
        filter: &MatchFilter,
    ) -> Result<Vec<Match>, RetrievalError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let raw = self
            .index
            .query(&vector, top_k, filter)
            .await
            .map_err(|e| RetrievalError::Index(e.to_string()))?;

        let mut matches: Vec<Match> = normalize(&raw)
            .into_iter()
            .filter(|m| m.score >= self.min_score)
            .collect();

        // Indexes already rank their results; a stable sort keeps their tie order
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);

        debug!(
            "Retrieved {} matches (top_k={}, job filter={:?})",
            matches.len(),
            top_k,
            filter.job_id
        );

        Ok(matches)
    }
}
