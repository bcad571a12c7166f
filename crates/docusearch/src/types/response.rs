//! Response types for engine operations

use serde::{Deserialize, Serialize};

use super::document::Chunk;

/// Source descriptor attached to an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Paper label (filename without extension)
    pub paper: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// First characters of the chunk text
    pub content_preview: String,
}

impl SourceRef {
    /// Build a source descriptor from a retrieved chunk
    pub fn from_chunk(chunk: &Chunk, preview_chars: usize) -> Self {
        Self {
            paper: chunk.source.paper.clone(),
            page: chunk.source.page_number,
            content_preview: chunk.preview(preview_chars),
        }
    }
}

/// Answer to a question with the sources it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Generated answer
    pub answer: String,
    /// Sources in retrieval-rank order; `[Source N]` is `sources[N - 1]`
    pub sources: Vec<SourceRef>,
    /// Number of sources used
    pub num_sources: usize,
}

impl QueryResult {
    /// Create a result from an answer and its sources
    pub fn new(answer: String, sources: Vec<SourceRef>) -> Self {
        Self {
            answer,
            num_sources: sources.len(),
            sources,
        }
    }

    /// Result returned when retrieval found nothing to ground an answer on
    pub fn insufficient() -> Self {
        Self::new(crate::generation::INSUFFICIENT_CONTEXT_ANSWER.to_string(), Vec::new())
    }
}

/// Outcome of indexing a batch of chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReport {
    /// Chunks added by this call
    pub indexed_chunks: usize,
    /// Total chunks in the index afterwards
    pub total_chunks: usize,
    /// Whether this call created the index
    pub created: bool,
}

/// Outcome of removing one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalResult {
    /// Chunks deleted
    pub removed_chunks: usize,
    /// Chunks left in the index
    pub remaining_chunks: usize,
}

/// Engine statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Whether an index exists
    pub initialized: bool,
    /// Total indexed chunks
    pub total_chunks: usize,
    /// Filenames currently loaded, in upload order
    pub loaded_documents: Vec<String>,
}

/// Response from `POST /api/upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Always "success" when the request itself succeeded
    pub status: String,
    /// Files that were ingested
    pub processed_files: Vec<String>,
    /// Chunks created by this upload
    pub total_chunks: usize,
    /// Per-file failures (partial success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Response from `POST /api/remove-file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveFileResponse {
    /// Always "success"
    pub status: String,
    /// Human-readable summary
    pub message: String,
    /// Chunks deleted
    pub removed_chunks: usize,
    /// Chunks left in the index
    pub remaining_chunks: usize,
}

impl RemoveFileResponse {
    /// Wrap an engine removal result
    pub fn new(filename: &str, result: RemovalResult) -> Self {
        Self {
            status: "success".to_string(),
            message: format!("Removed {}", filename),
            removed_chunks: result.removed_chunks,
            remaining_chunks: result.remaining_chunks,
        }
    }
}

/// Response from `GET /api/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Workspace the status describes
    pub workspace: String,
    /// Whether the workspace has an index
    pub initialized: bool,
    /// Filenames currently loaded
    pub files_loaded: Vec<String>,
    /// Total indexed chunks
    pub total_chunks: usize,
}

impl StatusResponse {
    /// Build from engine statistics
    pub fn new(workspace: &str, stats: IndexStats) -> Self {
        Self {
            workspace: workspace.to_string(),
            initialized: stats.initialized,
            files_loaded: stats.loaded_documents,
            total_chunks: stats.total_chunks,
        }
    }
}
