//! Answer generation: prompt assembly and language model clients

pub mod groq;
pub mod ollama;
pub mod prompt;
pub mod retry;

use std::sync::Arc;

use crate::config::{LlmBackend, LlmConfig};
use crate::error::Result;
use crate::providers::LlmProvider;

pub use groq::GroqLlm;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use prompt::PromptBuilder;

/// Answer returned when the retrieved context cannot support an answer
pub const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "The provided documents do not contain enough information to answer this question.";

/// Build the configured completion backend
pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.backend {
        LlmBackend::Groq => Arc::new(GroqLlm::new(config)?),
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(config)?),
    };

    tracing::info!("Using {} model {}", llm.name(), llm.model());
    Ok(llm)
}
