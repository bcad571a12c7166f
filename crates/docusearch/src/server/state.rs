//! Application state for the HTTP server
//!
//! Each workspace gets its own engine and index file. Engines are opened
//! lazily on first use and wrapped in an async `RwLock`: uploads, removals
//! and resets take the write half, questions and status take the read half.

use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::RagConfig;
use crate::engine::RagEngine;
use crate::error::Result;
use crate::generation::{build_llm, OllamaEmbedder};
use crate::ingestion::{PdfExtractor, PdfTextExtractor};
use crate::providers::{EmbeddingProvider, LlmProvider};

/// Shared handle to one workspace's engine
pub type EngineHandle = Arc<RwLock<RagEngine>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// PDF text extractor
    extractor: Arc<dyn PdfExtractor>,
    /// Embedding provider shared by all workspaces
    embedder: Arc<dyn EmbeddingProvider>,
    /// Completion provider shared by all workspaces
    generator: Arc<dyn LlmProvider>,
    /// Open engines by workspace name
    engines: DashMap<String, EngineHandle>,
}

impl AppState {
    /// Create state from explicit collaborators
    pub fn new(
        config: RagConfig,
        extractor: Arc<dyn PdfExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                extractor,
                embedder,
                generator,
                engines: DashMap::new(),
            }),
        }
    }

    /// Create state with the Ollama embedder and the configured completion backend
    pub fn from_config(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing application state (embeddings: {} via {})",
            config.embeddings.model,
            config.embeddings.base_url
        );

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
        let generator = build_llm(&config.llm)?;

        Ok(Self::new(
            config,
            Arc::new(PdfTextExtractor::new()),
            embedder,
            generator,
        ))
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Engine for `workspace`, opening it on first use
    ///
    /// The name must already be validated.
    pub fn engine(&self, workspace: &str) -> Result<EngineHandle> {
        if let Some(engine) = self.inner.engines.get(workspace) {
            return Ok(Arc::clone(engine.value()));
        }

        let entry = self
            .inner
            .engines
            .entry(workspace.to_string())
            .or_try_insert_with(|| {
                tracing::info!("Opening workspace '{}'", workspace);
                let engine = RagEngine::open(
                    &self.inner.config,
                    self.index_path(workspace),
                    Arc::clone(&self.inner.extractor),
                    Arc::clone(&self.inner.embedder),
                    Arc::clone(&self.inner.generator),
                )?;
                Ok::<_, crate::error::Error>(Arc::new(RwLock::new(engine)))
            })?;

        Ok(Arc::clone(entry.value()))
    }

    fn index_path(&self, workspace: &str) -> PathBuf {
        self.inner
            .config
            .workspaces_dir()
            .join(workspace)
            .join("index.sqlite3")
    }
}
