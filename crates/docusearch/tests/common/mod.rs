//! Deterministic stand-ins for the PDF extractor, embedder and generator

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use docusearch::config::RagConfig;
use docusearch::ingestion::PdfExtractor;
use docusearch::providers::{EmbeddingProvider, LlmProvider};
use docusearch::{Error, Page, RagEngine, Result};

/// Buckets in the hashed bag-of-words embedding
pub const BUCKETS: usize = 64;

/// `count` copies of `word` joined by single spaces
pub fn words(word: &str, count: usize) -> String {
    vec![word; count].join(" ")
}

/// Hashed bag-of-words embedder (FNV-1a per lowercase token)
pub struct HashEmbedder;

fn fnv1a(token: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in token.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; BUCKETS + 1];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            v[(fnv1a(token) % BUCKETS as u64) as usize] += 1.0;
        }
        // Keeps every vector non-zero
        v[BUCKETS] = 0.1;
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        BUCKETS + 1
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Embedder whose every call fails with provider detail in the message
pub struct FailingEmbedder;

impl FailingEmbedder {
    pub const DETAIL: &'static str = "connection refused: http://10.0.0.7:11434/api/embeddings";
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::embedding(Self::DETAIL))
    }

    fn dimensions(&self) -> usize {
        BUCKETS + 1
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Generator that records every prompt and answers with a fixed citation
#[derive(Default)]
pub struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub const ANSWER: &'static str = "Attention is explained in [Source 1].";

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for RecordingGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok(Self::ANSWER.to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn model(&self) -> &str {
        "fake"
    }
}

/// Generator whose every call fails with provider detail in the message
pub struct FailingGenerator;

impl FailingGenerator {
    pub const DETAIL: &'static str = "HTTP 401 - invalid api key gsk_supersecret";
}

#[async_trait]
impl LlmProvider for FailingGenerator {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(Error::generation(Self::DETAIL))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "fake"
    }
}

/// Extractor returning canned pages per filename
#[derive(Default)]
pub struct CannedExtractor {
    documents: HashMap<String, Vec<Page>>,
}

impl CannedExtractor {
    pub fn with(mut self, filename: &str, pages: Vec<Page>) -> Self {
        self.documents.insert(filename.to_string(), pages);
        self
    }
}

impl PdfExtractor for CannedExtractor {
    fn extract_pages(&self, filename: &str, _data: &[u8]) -> Result<Vec<Page>> {
        self.documents
            .get(filename)
            .cloned()
            .ok_or_else(|| Error::invalid_document(filename, "Failed to load PDF"))
    }
}

/// Two-page paper: 1799 characters of "attn" then 399 characters of "conv"
pub fn two_page_paper() -> Vec<Page> {
    vec![
        Page::new(1, words("attn", 360)),
        Page::new(2, words("conv", 80)),
    ]
}

/// Extractor knowing `paper.pdf` (two pages) and `notes.pdf` (one page)
pub fn extractor() -> Arc<CannedExtractor> {
    Arc::new(
        CannedExtractor::default()
            .with("paper.pdf", two_page_paper())
            .with("notes.pdf", vec![Page::new(1, words("memory", 50))]),
    )
}

/// Configuration with 1000/200 chunking
pub fn test_config(data_dir: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    config.chunking.chunk_size = 1000;
    config.chunking.chunk_overlap = 200;
    config.storage.data_dir = data_dir.to_path_buf();
    config
}

/// Engine over `<dir>/index.sqlite3` with the given generator
pub fn engine(dir: &Path, generator: Arc<dyn LlmProvider>) -> RagEngine {
    engine_with(dir, Arc::new(HashEmbedder), generator)
}

/// Engine over `<dir>/index.sqlite3` with explicit providers
pub fn engine_with(
    dir: &Path,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn LlmProvider>,
) -> RagEngine {
    RagEngine::open(
        &test_config(dir),
        dir.join("index.sqlite3"),
        extractor(),
        embedder,
        generator,
    )
    .expect("engine opens")
}
