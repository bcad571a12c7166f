//! Ingestion pipeline: PDF bytes to page-tagged chunks

use std::sync::Arc;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document, Page};

use super::chunker::TextChunker;
use super::normalize::normalize_text;
use super::parser::PdfExtractor;

/// A processed document and its chunks, not yet indexed
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    /// Record of the uploaded file
    pub document: Document,
    /// Page-tagged chunks in document order
    pub chunks: Vec<Chunk>,
}

/// Extracts, normalizes and chunks one document
pub struct IngestPipeline {
    extractor: Arc<dyn PdfExtractor>,
    chunker: TextChunker,
}

impl IngestPipeline {
    /// Create a pipeline from an extractor and chunking settings
    pub fn new(extractor: Arc<dyn PdfExtractor>, config: &ChunkingConfig) -> Self {
        Self {
            extractor,
            chunker: TextChunker::new(config.chunk_size, config.chunk_overlap),
        }
    }

    /// The chunker used by this pipeline
    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Turn raw PDF bytes into chunks without indexing them
    pub fn process(&self, data: &[u8], filename: &str) -> Result<Vec<Chunk>> {
        self.process_document(data, filename).map(|ingested| ingested.chunks)
    }

    /// Like [`process`](Self::process), also returning the document record
    ///
    /// `page_count` counts every extracted page, including blank ones.
    pub fn process_document(&self, data: &[u8], filename: &str) -> Result<IngestedDocument> {
        let pages = self.extractor.extract_pages(filename, data)?;
        let page_count = pages.len();

        let pages: Vec<Page> = pages
            .into_iter()
            .map(|page| Page::new(page.number, normalize_text(&page.text)))
            .collect();

        if pages.iter().all(|p| p.text.trim().is_empty()) {
            return Err(Error::invalid_document(
                filename,
                "PDF contains no extractable text",
            ));
        }

        let chunks = self.chunker.split_pages(filename, &pages);
        if chunks.is_empty() {
            return Err(Error::invalid_document(filename, "PDF produced no text chunks"));
        }

        tracing::info!(
            "Processed {}: {} pages, {} chunks",
            filename,
            page_count,
            chunks.len()
        );

        Ok(IngestedDocument {
            document: Document::new(filename, page_count as u32, data),
            chunks,
        })
    }
}
