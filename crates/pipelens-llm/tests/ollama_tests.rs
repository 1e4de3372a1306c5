//! Integration tests for the Ollama clients
//!
//! A throwaway axum server stands in for the Ollama API.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use pipelens_domain::traits::{EmbeddingModel, GenerationBackend, GenerationRequest};
use pipelens_llm::{extract_response, LlmError, OllamaBackend, OllamaEmbeddingModel};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest {
        prompt: prompt.to_string(),
        temperature: 0.1,
        max_tokens: 512,
    }
}

type Seen = Arc<Mutex<Vec<Value>>>;

async fn generate(State(seen): State<Seen>, Json(body): Json<Value>) -> String {
    let streamed = body["stream"].as_bool().unwrap_or(false);
    seen.lock().unwrap().push(body);
    if streamed {
        [
            r#"{"model":"llama3.1","response":"Root cause: ","done":false}"#,
            r#"{"model":"llama3.1","response":"disk full.","done":false}"#,
            r#"{"model":"llama3.1","response":"","done":true}"#,
        ]
        .join("\n")
    } else {
        json!({"model": "llama3.1", "response": " Root cause: disk full. ", "done": true}).to_string()
    }
}

#[tokio::test]
async fn test_streamed_reply_is_concatenated() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/api/generate", post(generate))
        .with_state(seen.clone());
    let endpoint = spawn(app).await;

    let backend = OllamaBackend::new(endpoint, "llama3.1", Duration::from_secs(5)).unwrap();
    let raw = backend.generate(&request("why did it fail?")).await.unwrap();
    assert_eq!(extract_response(&raw).unwrap(), "Root cause: disk full.");

    let bodies = seen.lock().unwrap();
    assert_eq!(bodies[0]["model"], "llama3.1");
    assert_eq!(bodies[0]["prompt"], "why did it fail?");
    assert_eq!(bodies[0]["stream"], true);
    assert_eq!(bodies[0]["options"]["num_predict"], 512);
}

#[tokio::test]
async fn test_single_document_reply() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/api/generate", post(generate))
        .with_state(seen.clone());
    let endpoint = spawn(app).await;

    let backend = OllamaBackend::new(format!("{}/api/generate", endpoint), "llama3.1", Duration::from_secs(5))
        .unwrap()
        .with_stream(false);
    let raw = backend.generate(&request("q")).await.unwrap();
    assert_eq!(extract_response(&raw).unwrap(), "Root cause: disk full.");
    assert_eq!(seen.lock().unwrap()[0]["stream"], false);
}

#[tokio::test]
async fn test_missing_model_is_reported() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::NOT_FOUND, r#"{"error":"model 'nope' not found"}"#) }),
    );
    let endpoint = spawn(app).await;

    let backend = OllamaBackend::new(endpoint, "nope", Duration::from_secs(5)).unwrap();
    let err = backend.generate(&request("q")).await.unwrap_err();
    assert_eq!(err, LlmError::ModelNotAvailable("nope".to_string()));
}

#[tokio::test]
async fn test_server_error_is_communication_error() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let endpoint = spawn(app).await;

    let backend = OllamaBackend::new(endpoint, "llama3.1", Duration::from_secs(5)).unwrap();
    match backend.generate(&request("q")).await {
        Err(LlmError::Communication(message)) => assert!(message.contains("boom")),
        other => panic!("Expected Communication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    );
    let endpoint = spawn(app).await;

    let backend = OllamaBackend::new(endpoint, "llama3.1", Duration::from_millis(200)).unwrap();
    let err = backend.generate(&request("q")).await.unwrap_err();
    assert!(matches!(err, LlmError::Timeout(_)));
    assert!(err.is_unavailable());
}

#[tokio::test]
async fn test_embedding_model() {
    let app = Router::new().route(
        "/api/embeddings",
        post(|Json(body): Json<Value>| async move {
            let len = body["prompt"].as_str().unwrap_or("").len() as f32;
            Json(json!({ "embedding": [len, 1.0, 0.0] }))
        }),
    );
    let endpoint = spawn(app).await;

    let model = OllamaEmbeddingModel::new(endpoint.clone(), "nomic-embed-text", 3).unwrap();
    assert_eq!(model.embed("abcd").await.unwrap(), vec![4.0, 1.0, 0.0]);

    let wrong = OllamaEmbeddingModel::new(endpoint, "nomic-embed-text", 8).unwrap();
    assert!(matches!(
        wrong.embed("abcd").await,
        Err(LlmError::InvalidResponse(_))
    ));
}
