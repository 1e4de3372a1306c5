//! Pipelens Query Service
//!
//! Wires the configured embedder, index and generation backend into an
//! HTTP service answering questions about ingested CI/CD logs.

#![warn(missing_docs)]

pub mod backends;
pub mod config;
pub mod handlers;

use backends::{AnyEmbedder, AnyIndex, EmbedderError};
use config::ServerConfig;
use handlers::{create_router, AppState};
use pipelens_ingest::{IngestError, IngestPipeline};
use pipelens_llm::{LlmError, OllamaBackend};
use pipelens_store::{IndexError, Retriever};
use pipelens_synthesizer::{GeneratedSynthesizer, SynthesisError, Synthesizer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Service error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Embedding backend could not be built
    #[error("Embedding backend error: {0}")]
    Embedding(#[from] EmbedderError),

    /// Index backend could not be built
    #[error("Index backend error: {0}")]
    Index(#[from] IndexError),

    /// Generation backend could not be built
    #[error("Generation backend error: {0}")]
    Generation(#[from] LlmError),

    /// Synthesizer could not be built
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Ingestion failed
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `default_level`. Safe to call more than once.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// The backends described by a [`ServerConfig`]
///
/// The embedder and index are shared: vectors written through
/// [`Services::ingest_pipeline`] are visible to [`Services::retriever`].
#[derive(Debug, Clone)]
pub struct Services {
    config: ServerConfig,
    embedder: AnyEmbedder,
    index: AnyIndex,
}

impl Services {
    /// Build the embedder and index named in `config`
    pub fn from_config(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let embedder = AnyEmbedder::from_config(&config.embedding)?;
        let index = AnyIndex::from_config(&config)?;
        info!(
            "Using {} index with {}-dimensional embeddings",
            index.name(),
            config.embedding.dimension()
        );
        Ok(Self {
            config,
            embedder,
            index,
        })
    }

    /// The configuration these services were built from
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The shared index
    pub fn index(&self) -> &AnyIndex {
        &self.index
    }

    /// Retriever over the shared index, honouring `min_score`
    pub fn retriever(&self) -> Retriever<AnyEmbedder, AnyIndex> {
        let retriever = Retriever::new(self.embedder.clone(), self.index.clone());
        match self.config.min_score {
            Some(min_score) => retriever.with_min_score(min_score),
            None => retriever,
        }
    }

    /// Ingestion pipeline writing to the shared index
    pub fn ingest_pipeline(&self) -> Result<IngestPipeline<AnyEmbedder, AnyIndex>, ServerError> {
        Ok(IngestPipeline::new(
            self.config.ingest.clone(),
            self.embedder.clone(),
            self.index.clone(),
        )?)
    }

    /// Synthesizer for the configured strategy
    ///
    /// The Ollama backend is only built when the strategy uses it.
    pub fn synthesizer(&self) -> Result<Synthesizer<OllamaBackend>, ServerError> {
        let strategy = self.config.strategy;
        let generated = if strategy.needs_backend() {
            let generation = &self.config.generation;
            let backend = OllamaBackend::new(
                generation.endpoint.as_str(),
                generation.model.as_str(),
                generation.timeout(),
            )?
            .with_stream(generation.stream)
            .with_max_attempts(generation.max_attempts);
            info!("Generation backend: {}", generation.model);
            Some(
                GeneratedSynthesizer::new(backend)
                    .with_timeout(generation.timeout())
                    .with_temperature(generation.temperature)
                    .with_max_tokens(generation.max_tokens),
            )
        } else {
            None
        };
        Ok(Synthesizer::new(strategy, generated)?)
    }

    /// Application state for the HTTP service
    pub fn app_state(&self) -> Result<AppState<OllamaBackend>, ServerError> {
        Ok(AppState {
            retriever: Arc::new(self.retriever()),
            synthesizer: Arc::new(self.synthesizer()?),
            top_k: self.config.top_k,
        })
    }
}

/// Start the query service
///
/// Files in `ingest` are indexed before the listener opens; with the
/// in-process index this is the only way to load evidence.
pub async fn start_server(config: ServerConfig, ingest: &[std::path::PathBuf]) -> Result<(), ServerError> {
    info!("Starting Pipelens query service");
    info!("Bind address: {}", config.bind_addr());
    info!("Answer strategy: {}", config.strategy);

    let services = Services::from_config(config)?;

    if !ingest.is_empty() {
        let pipeline = services.ingest_pipeline()?;
        for path in ingest {
            let report = pipeline.ingest_file(path, None).await?;
            info!(
                "Ingested {}: {} lines, {} chunks",
                report.source, report.lines, report.chunks_created
            );
        }
    }

    let app = create_router(services.app_state()?);

    let bind_addr = services.config().bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Query service listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
