//! DocuSearch server binary
//!
//! Run with: cargo run -p docusearch --bin docusearch-server
//!
//! Reads `.env`, then an optional TOML file named by `DOCUSEARCH_CONFIG`,
//! then environment overrides.

use std::path::PathBuf;

use docusearch::{config::RagConfig, providers::EmbeddingProvider, server::DocuSearchServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docusearch=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        tracing::info!("Loaded environment from {}", path.display());
    }

    let config_path = std::env::var("DOCUSEARCH_CONFIG").ok().map(PathBuf::from);
    let mut config = RagConfig::load(config_path.as_deref())?;
    config.apply_env();
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - LLM: {:?} {}", config.llm.backend, config.llm.model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Data directory: {}", config.storage.data_dir.display());

    let server = DocuSearchServer::new(config)?;

    // Ollama is only needed once documents are uploaded, so a failed check is a warning
    let embeddings = &server.config().embeddings;
    match server.state().embedder().health_check().await {
        Ok(true) => tracing::info!("Ollama is running at {}", embeddings.base_url),
        _ => {
            tracing::warn!("Ollama not available at {}", embeddings.base_url);
            tracing::warn!("  Start it with: ollama serve");
            tracing::warn!("  Pull the embedding model: ollama pull {}", embeddings.model);
        }
    }

    tracing::info!("API: http://{}", server.address());
    tracing::info!("Health: http://{}/health", server.address());

    server.start().await?;

    Ok(())
}
