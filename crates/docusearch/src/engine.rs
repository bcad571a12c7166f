//! Retrieval-augmented question answering over one vector index
//!
//! A `RagEngine` owns exactly one index. It performs no locking of its own:
//! mutating calls take `&mut self`, so the owner decides how they are
//! serialized (the HTTP layer wraps each engine in an `RwLock`).

use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{RagConfig, RetrievalConfig};
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::ingestion::{IngestPipeline, IngestedDocument, PdfExtractor};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::{SearchMode, VectorIndex};
use crate::types::{Chunk, IndexReport, IndexStats, QueryResult, RemovalResult, SourceRef};

/// Question-answering engine
pub struct RagEngine {
    pipeline: Arc<IngestPipeline>,
    index: VectorIndex,
    generator: Arc<dyn LlmProvider>,
    retrieval: RetrievalConfig,
    /// Filenames in upload order, without duplicates
    loaded_documents: Vec<String>,
}

impl RagEngine {
    /// Open an engine over the index file at `index_path`
    ///
    /// An existing index is reopened and its document registry rebuilt.
    pub fn open(
        config: &RagConfig,
        index_path: impl Into<PathBuf>,
        extractor: Arc<dyn PdfExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let index = VectorIndex::open(index_path, embedder)?;
        let loaded_documents = index.documents()?;

        if index.is_initialized() {
            tracing::info!(
                "Loaded index with {} documents from {}",
                loaded_documents.len(),
                index.path().display()
            );
        }

        Ok(Self {
            pipeline: Arc::new(IngestPipeline::new(extractor, &config.chunking)),
            index,
            generator,
            retrieval: config.retrieval.clone(),
            loaded_documents,
        })
    }

    /// Extract and chunk one PDF without indexing it
    pub async fn ingest(&self, data: Bytes, filename: &str) -> Result<Vec<Chunk>> {
        self.ingest_document(data, filename)
            .await
            .map(|ingested| ingested.chunks)
    }

    /// Extract and chunk one PDF, keeping the document record
    pub async fn ingest_document(&self, data: Bytes, filename: &str) -> Result<IngestedDocument> {
        let pipeline = Arc::clone(&self.pipeline);
        let name = filename.to_string();

        tokio::task::spawn_blocking(move || pipeline.process_document(&data, &name))
            .await
            .map_err(|e| Error::internal(format!("Ingest task failed: {}", e)))?
    }

    /// Index chunks, creating the index on first use
    pub async fn index(&mut self, chunks: &[Chunk]) -> Result<IndexReport> {
        if chunks.is_empty() {
            return Err(Error::EmptyInput("no chunks to index".to_string()));
        }

        let created = !self.index.is_initialized();
        let indexed_chunks = if created {
            self.index.create(chunks).await?
        } else {
            self.index.add(chunks).await?
        };

        for chunk in chunks {
            let filename = &chunk.source.filename;
            if !self.loaded_documents.contains(filename) {
                self.loaded_documents.push(filename.clone());
            }
        }

        Ok(IndexReport {
            indexed_chunks,
            total_chunks: self.index.count()?,
            created,
        })
    }

    /// Answer a question from the `k` most useful chunks
    ///
    /// `k` is clamped to `[1, max_k]`.
    pub async fn answer(&self, question: &str, k: usize) -> Result<QueryResult> {
        if !self.index.is_initialized() {
            return Err(Error::NotIndexed);
        }

        let k = k.clamp(1, self.retrieval.max_k.max(1));
        let mode = SearchMode::Diversity {
            fetch_multiplier: self.retrieval.fetch_multiplier,
            lambda: self.retrieval.lambda,
        };

        let hits = self.index.search(question, k, mode).await?;
        if hits.is_empty() {
            tracing::info!("No chunks retrieved; returning insufficiency answer");
            return Ok(QueryResult::insufficient());
        }

        for (rank, hit) in hits.iter().enumerate() {
            tracing::debug!(
                "[Source {}] {} (score {:.3})",
                rank + 1,
                hit.chunk.source.format_citation(),
                hit.score
            );
        }

        let chunks: Vec<Chunk> = hits.into_iter().map(|hit| hit.chunk).collect();
        let context = PromptBuilder::build_context(&chunks);
        let prompt = PromptBuilder::build_rag_prompt(question, &context);

        let answer = self.generator.complete(&prompt).await.map_err(|e| {
            tracing::error!(
                "Generation with {} ({}) failed: {}",
                self.generator.name(),
                self.generator.model(),
                e
            );
            Error::generation("Failed to generate an answer")
        })?;

        let sources = chunks
            .iter()
            .map(|chunk| SourceRef::from_chunk(chunk, self.retrieval.preview_chars))
            .collect();

        Ok(QueryResult::new(answer, sources))
    }

    /// Remove every chunk of one document
    pub fn remove_document(&mut self, filename: &str) -> Result<RemovalResult> {
        let result = match self.index.delete_by_document(filename) {
            Err(Error::IndexNotInitialized) => return Err(Error::NotFound(filename.to_string())),
            other => other?,
        };

        self.loaded_documents.retain(|name| name != filename);
        Ok(result)
    }

    /// Current statistics; zeroed when nothing is indexed
    pub fn stats(&self) -> IndexStats {
        let total_chunks = self.index.count().unwrap_or_else(|e| {
            tracing::warn!("Failed to count index entries: {}", e);
            0
        });

        IndexStats {
            initialized: self.index.is_initialized(),
            total_chunks,
            loaded_documents: self.loaded_documents.clone(),
        }
    }

    /// Discard the index and the document registry
    pub fn reset(&mut self) {
        if let Err(e) = self.index.reset() {
            tracing::warn!("Index cleanup during reset failed: {}", e);
        }
        self.loaded_documents.clear();
    }

    /// Whether anything has been indexed
    pub fn is_indexed(&self) -> bool {
        self.index.is_initialized()
    }
}
