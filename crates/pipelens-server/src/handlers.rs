//! HTTP request handlers for the query service.
//!
//! Implements the question-answering and health check endpoints using axum.

use crate::backends::{AnyEmbedder, AnyIndex};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use pipelens_domain::traits::GenerationBackend;
use pipelens_domain::{EvidenceSummary, MatchFilter, SynthesizedAnswer};
use pipelens_store::{RetrievalError, Retriever};
use pipelens_synthesizer::{Strategy, SynthesisError, Synthesizer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
pub struct AppState<G> {
    /// Question → ranked matches
    pub retriever: Arc<Retriever<AnyEmbedder, AnyIndex>>,
    /// Ranked matches → answer
    pub synthesizer: Arc<Synthesizer<G>>,
    /// Matches retrieved per question unless the request says otherwise
    pub top_k: usize,
}

// Manual impl: cloning shares the Arcs and must not require `G: Clone`
impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            retriever: Arc::clone(&self.retriever),
            synthesizer: Arc::clone(&self.synthesizer),
            top_k: self.top_k,
        }
    }
}

/// Question request
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Natural-language question
    pub question: String,
    /// Restrict retrieval to one pipeline run
    #[serde(default)]
    pub job_id: Option<String>,
    /// Override the configured retrieval depth
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Override the configured strategy
    #[serde(default)]
    pub strategy: Option<Strategy>,
    /// Include the structured evidence summary
    #[serde(default)]
    pub include_evidence: bool,
}

/// Question response
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Answer text; empty when nothing was retrieved
    pub answer: String,
    /// Ids of the matches the answer was drawn from, in rank order
    pub sources: Vec<String>,
    /// Prompt sent to the generation backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_used: Option<String>,
    /// Structured answer from the heuristic strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<SynthesizedAnswer>,
    /// Evidence summary, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceSummary>,
}

impl QueryResponse {
    /// The response for a question with no retrieved evidence
    pub fn empty() -> Self {
        Self {
            answer: String::new(),
            sources: Vec::new(),
            prompt_used: None,
            structured: None,
            evidence: None,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Index backend name
    pub index_backend: String,
    /// Generation backend description
    pub generation_backend: String,
    /// Configured answer strategy
    pub strategy: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// The request itself is unusable
    BadRequest(String),
    /// Retrieval-related error
    RetrievalError(RetrievalError),
    /// Synthesis-related error
    SynthesisError(SynthesisError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::RetrievalError(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            AppError::SynthesisError(e @ SynthesisError::GenerationUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            AppError::SynthesisError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        warn!("Request failed with {}: {}", status, message);
        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<RetrievalError> for AppError {
    fn from(e: RetrievalError) -> Self {
        AppError::RetrievalError(e)
    }
}

impl From<SynthesisError> for AppError {
    fn from(e: SynthesisError) -> Self {
        AppError::SynthesisError(e)
    }
}

/// POST /query - Answer a question from the indexed logs
///
/// Nothing retrieved means an empty answer; synthesis is not invoked.
async fn query_logs<G>(
    State(state): State<AppState<G>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError>
where
    G: GenerationBackend + 'static,
{
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("question must not be empty".to_string()));
    }

    let filter = MatchFilter {
        job_id: request.job_id.filter(|id| !id.trim().is_empty()),
    };
    let top_k = request.top_k.unwrap_or(state.top_k);

    let matches = state.retriever.query(question, top_k, &filter).await?;
    if matches.is_empty() {
        info!("No matches for question (job filter={:?})", filter.job_id);
        return Ok(Json(QueryResponse::empty()));
    }

    let strategy = request.strategy.unwrap_or(state.synthesizer.strategy());
    let synthesis = state
        .synthesizer
        .synthesize_with(strategy, question, &matches)
        .await?;

    info!(
        "Answered from {} matches with the {} strategy",
        matches.len(),
        synthesis.strategy
    );

    Ok(Json(QueryResponse {
        answer: synthesis.answer,
        sources: matches.into_iter().map(|m| m.id).collect(),
        prompt_used: synthesis.prompt,
        structured: synthesis.structured,
        evidence: request.include_evidence.then_some(synthesis.evidence),
    }))
}

/// GET /health - Service health and wiring
async fn health_check<G>(State(state): State<AppState<G>>) -> Json<HealthCheckResponse>
where
    G: GenerationBackend + 'static,
{
    Json(HealthCheckResponse {
        status: "ok".to_string(),
        index_backend: state.retriever.index().name().to_string(),
        generation_backend: state
            .synthesizer
            .backend_description()
            .unwrap_or_else(|| "none".to_string()),
        strategy: state.synthesizer.strategy().to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router<G>(state: AppState<G>) -> AxumRouter
where
    G: GenerationBackend + 'static,
{
    AxumRouter::new()
        .route("/query", post(query_logs::<G>))
        .route("/health", get(health_check::<G>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use pipelens_llm::MockBackend;
    use pipelens_store::{HashEmbeddingModel, MemoryIndex};
    use tower::ServiceExt; // for oneshot

    fn create_test_state() -> AppState<MockBackend> {
        let retriever = Retriever::new(
            AnyEmbedder::Hash(HashEmbeddingModel::new(32)),
            AnyIndex::Memory(MemoryIndex::new(32)),
        );
        AppState {
            retriever: Arc::new(retriever),
            synthesizer: Arc::new(Synthesizer::new(Strategy::Heuristic, None).unwrap()),
            top_k: 10,
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/query")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"question": "   "}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
