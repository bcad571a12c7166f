//! Document, page and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One page of extracted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,
    /// Raw text content of the page
    pub text: String,
}

impl Page {
    /// Create a page
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// An uploaded PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Sanitized filename, unique within a workspace
    pub filename: String,
    /// Number of pages in the PDF
    pub page_count: u32,
    /// SHA-256 of the uploaded bytes
    pub content_hash: String,
    /// Size in bytes
    pub file_size: u64,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a document record
    pub fn new(filename: impl Into<String>, page_count: u32, data: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            page_count,
            content_hash: content_hash(data),
            file_size: data.len() as u64,
            ingested_at: chrono::Utc::now(),
        }
    }

    /// Paper label shown in citations
    pub fn paper(&self) -> String {
        paper_label(&self.filename)
    }
}

/// Hex SHA-256 of raw bytes
pub fn content_hash(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(data))
}

/// Filename without its final extension (`paper.pdf` -> `paper`)
pub fn paper_label(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

/// Provenance of a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Source document filename
    pub filename: String,
    /// Paper label (filename without extension)
    pub paper: String,
    /// Page number (1-indexed)
    pub page_number: u32,
}

impl ChunkSource {
    /// Create source info for a page of a PDF
    pub fn pdf(filename: impl Into<String>, page_number: u32) -> Self {
        let filename = filename.into();
        Self {
            paper: paper_label(&filename),
            filename,
            page_number,
        }
    }

    /// Format source for display
    pub fn format_citation(&self) -> String {
        format!("{}, Page {}", self.paper, self.page_number)
    }
}

/// A slice of page text ready for indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Text content
    pub content: String,
    /// Source information for citations
    pub source: ChunkSource,
    /// Chunk index within its document
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(content: String, source: ChunkSource, chunk_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            source,
            chunk_index,
        }
    }

    /// Bounded preview of the chunk text
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let preview: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", preview)
        } else {
            preview
        }
    }
}
