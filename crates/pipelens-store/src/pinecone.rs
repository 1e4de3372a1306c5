//! Hosted vector index client
//!
//! Talks to a Pinecone-compatible data plane over HTTP:
//!
//! - `POST {host}/vectors/upsert` with `{"vectors": [...], "namespace": ...}`
//! - `POST {host}/query` with `{"vector", "topK", "includeMetadata", "filter"}`
//! - `POST {host}/describe_index_stats`
//!
//! Query results are returned raw; callers run them through
//! [`normalize`](crate::normalize) before use.

use crate::IndexError;
use async_trait::async_trait;
use pipelens_domain::traits::{RawMatch, VectorIndex, VectorRecord};
use pipelens_domain::MatchFilter;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Default timeout for index requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for a hosted Pinecone-compatible index
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    host: String,
    api_key: String,
    namespace: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a pipelens_domain::Metadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: Option<usize>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    total_vector_count: usize,
    #[serde(default)]
    namespaces: std::collections::HashMap<String, NamespaceStats>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: usize,
}

impl PineconeIndex {
    /// Create a client for the index served at `host`
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Internal`] if the HTTP client cannot be built.
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| IndexError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            host: host.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            namespace: None,
            client,
        })
    }

    /// Scope every operation to a namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Index host this client talks to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the metadata filter document for a query
    pub fn filter_document(filter: &MatchFilter) -> Option<Value> {
        filter
            .job_id
            .as_ref()
            .map(|job_id| json!({ "job_id": { "$eq": job_id } }))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, IndexError> {
        let url = format!("{}{}", self.host, path);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| IndexError::Communication(format!("Request to {} failed: {}", url, e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(IndexError::Status { status, body })
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    type Error = IndexError;

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, Self::Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let vectors: Vec<UpsertVector<'_>> = records
            .iter()
            .map(|r| UpsertVector {
                id: &r.id,
                values: &r.values,
                metadata: &r.metadata,
            })
            .collect();

        let mut body = json!({ "vectors": vectors });
        if let Some(namespace) = &self.namespace {
            body["namespace"] = json!(namespace);
        }

        let response: UpsertResponse = self
            .post("/vectors/upsert", &body)
            .await?
            .json()
            .await
            .map_err(|e| IndexError::InvalidResponse(format!("Failed to parse upsert response: {}", e)))?;

        let count = response.upserted_count.unwrap_or(records.len());
        debug!("Index acknowledged {} upserted vectors", count);
        Ok(count)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &MatchFilter,
    ) -> Result<Vec<RawMatch>, Self::Error> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        if let Some(filter) = Self::filter_document(filter) {
            body["filter"] = filter;
        }
        if let Some(namespace) = &self.namespace {
            body["namespace"] = json!(namespace);
        }

        let response: QueryResponse = self
            .post("/query", &body)
            .await?
            .json()
            .await
            .map_err(|e| IndexError::InvalidResponse(format!("Failed to parse query response: {}", e)))?;

        Ok(response.matches)
    }

    async fn count(&self) -> Result<usize, Self::Error> {
        let stats: StatsResponse = self
            .post("/describe_index_stats", &json!({}))
            .await?
            .json()
            .await
            .map_err(|e| IndexError::InvalidResponse(format!("Failed to parse index stats: {}", e)))?;

        Ok(match &self.namespace {
            Some(namespace) => stats
                .namespaces
                .get(namespace)
                .map(|ns| ns.vector_count)
                .unwrap_or(0),
            None => stats.total_vector_count,
        })
    }
}
