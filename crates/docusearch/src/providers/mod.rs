//! Provider abstractions for embeddings and language models
//!
//! The engine only sees these traits, so the HTTP backends (Ollama, Groq)
//! can be swapped for in-process fakes in tests.

pub mod embedding;
pub mod llm;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
