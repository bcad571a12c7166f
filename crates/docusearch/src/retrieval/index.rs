//! Vector index over embedded chunks
//!
//! The index owns its SQLite file and the embedder. It is uninitialized until
//! the first successful `create`, and goes back to uninitialized on `reset`.
//! Callers serialize mutating operations; the store itself is only guarded
//! against concurrent connection use.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, RemovalResult};

use super::mmr::{cosine_similarity, l2_normalize, maximal_marginal_relevance};
use super::store::IndexStore;

/// How `search` ranks results
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchMode {
    /// Nearest neighbours by cosine similarity
    Similarity,
    /// Maximal marginal relevance over a `k * fetch_multiplier` candidate pool
    Diversity {
        /// Candidate pool multiplier
        fetch_multiplier: usize,
        /// 1.0 = pure relevance, 0.0 = pure diversity
        lambda: f32,
    },
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Durable similarity-searchable chunk index
pub struct VectorIndex {
    path: PathBuf,
    store: Option<IndexStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorIndex {
    /// Open the index at `path`; an existing file is reopened as initialized
    pub fn open(path: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let path = path.into();
        let store = if path.exists() {
            tracing::info!("Reopening vector index at {}", path.display());
            Some(IndexStore::open(&path)?)
        } else {
            None
        };

        Ok(Self {
            path,
            store,
            embedder,
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `create` has succeeded and no `reset` followed
    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    /// Create the index from an initial batch of chunks
    ///
    /// All chunks are embedded before anything is written, and the batch is
    /// inserted in one transaction; on failure no index file is left behind.
    pub async fn create(&mut self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Err(Error::EmptyInput("cannot create an index from zero chunks".to_string()));
        }
        if self.store.is_some() {
            return Err(Error::internal("vector index already exists"));
        }

        let embeddings = self.embed_chunks(chunks).await?;

        // Leftovers from an interrupted create
        remove_index_files(&self.path)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let inserted = IndexStore::open(&self.path)
            .and_then(|store| store.insert_entries(chunks, &embeddings).map(|n| (store, n)));

        match inserted {
            Ok((store, n)) => {
                tracing::info!("Created vector index with {} chunks", n);
                self.store = Some(store);
                Ok(n)
            }
            Err(e) => {
                if let Err(cleanup) = remove_index_files(&self.path) {
                    tracing::warn!("Failed to clean up partial index: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    /// Append chunks to an existing index; duplicates are not detected
    pub async fn add(&self, chunks: &[Chunk]) -> Result<usize> {
        let store = self.store.as_ref().ok_or(Error::IndexNotInitialized)?;
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embed_chunks(chunks).await?;
        let n = store.insert_entries(chunks, &embeddings)?;

        tracing::info!("Added {} chunks to vector index", n);
        Ok(n)
    }

    /// Return up to `k` chunks ranked for `query`
    pub async fn search(&self, query: &str, k: usize, mode: SearchMode) -> Result<Vec<ScoredChunk>> {
        let store = self.store.as_ref().ok_or(Error::IndexNotInitialized)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut query_vec = self.embedder.embed(query).await.map_err(|e| {
            tracing::error!("Embedding query with {} failed: {}", self.embedder.name(), e);
            Error::embedding("Failed to embed the question")
        })?;
        l2_normalize(&mut query_vec);

        let entries = store.all_entries()?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&query_vec, &entry.embedding)))
            .collect();
        // Stable: equal scores keep insertion order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let picked: Vec<(usize, f32)> = match mode {
            SearchMode::Similarity => ranked.into_iter().take(k).collect(),
            SearchMode::Diversity {
                fetch_multiplier,
                lambda,
            } => {
                let pool: Vec<(usize, f32)> = ranked
                    .into_iter()
                    .take(k.saturating_mul(fetch_multiplier.max(1)))
                    .collect();
                let candidates: Vec<Vec<f32>> = pool
                    .iter()
                    .map(|(i, _)| entries[*i].embedding.clone())
                    .collect();

                maximal_marginal_relevance(&query_vec, &candidates, k, lambda)
                    .into_iter()
                    .map(|p| pool[p])
                    .collect()
            }
        };

        let results = picked
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: entries[i].chunk.clone(),
                score,
            })
            .collect();

        Ok(results)
    }

    /// Remove every entry whose source document is `filename`
    pub fn delete_by_document(&self, filename: &str) -> Result<RemovalResult> {
        let store = self.store.as_ref().ok_or(Error::IndexNotInitialized)?;

        let removed = store.delete_by_source(filename)?;
        if removed == 0 {
            return Err(Error::NotFound(filename.to_string()));
        }

        let remaining = store.count()?;
        tracing::info!(
            "Removed {} chunks for {} ({} remaining)",
            removed,
            filename,
            remaining
        );

        Ok(RemovalResult {
            removed_chunks: removed,
            remaining_chunks: remaining,
        })
    }

    /// Total entries; 0 when uninitialized
    pub fn count(&self) -> Result<usize> {
        match &self.store {
            Some(store) => store.count(),
            None => Ok(0),
        }
    }

    /// Source filenames present in the index, in first-upload order
    pub fn documents(&self) -> Result<Vec<String>> {
        match &self.store {
            Some(store) => store.distinct_sources(),
            None => Ok(Vec::new()),
        }
    }

    /// Drop the index and delete its backing files; safe to call repeatedly
    pub fn reset(&mut self) -> Result<()> {
        // Close the connection before unlinking
        self.store = None;
        remove_index_files(&self.path)?;
        tracing::info!("Vector index reset");
        Ok(())
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        let mut embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            tracing::error!(
                "Embedding {} chunks with {} failed: {}",
                texts.len(),
                self.embedder.name(),
                e
            );
            Error::embedding("Failed to embed document chunks")
        })?;

        if embeddings.len() != chunks.len() {
            tracing::error!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            );
            return Err(Error::embedding("Embedding service returned an incomplete batch"));
        }

        let expected = self.embedder.dimensions();
        for embedding in &mut embeddings {
            if embedding.len() != expected {
                tracing::error!(
                    "Embedding has {} dimensions, expected {}",
                    embedding.len(),
                    expected
                );
                return Err(Error::embedding("Embedding dimensions do not match the index"));
            }
            l2_normalize(embedding);
        }

        Ok(embeddings)
    }
}

/// Delete the SQLite file and its WAL companions, ignoring missing files
fn remove_index_files(path: &Path) -> Result<()> {
    let mut candidates = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        candidates.push(PathBuf::from(name));
    }

    for file in candidates {
        match std::fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
