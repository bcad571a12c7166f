//! docusearch: question answering over uploaded PDF papers
//!
//! PDFs are split into page-tagged chunks, embedded into a per-workspace
//! SQLite vector index, and questions are answered by a language model from
//! diversity-ranked chunks, citing them as `[Source N]`.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use engine::RagEngine;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, ChunkSource, Document, Page},
    query::QueryRequest,
    response::{IndexStats, QueryResult, SourceRef},
};
