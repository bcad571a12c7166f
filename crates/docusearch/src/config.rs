//! Configuration for the question-answering service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Embedding service configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Index storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                toml::from_str(&raw).map_err(|e| {
                    Error::Config(format!("Failed to parse {}: {}", path.display(), e))
                })?
            }
            None => Self::default(),
        };

        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("DOCUSEARCH_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("DOCUSEARCH_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid DOCUSEARCH_PORT: {}", port),
            }
        }
        if let Ok(dir) = std::env::var("DOCUSEARCH_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.embeddings.base_url = url.clone();
            if self.llm.backend == LlmBackend::Ollama {
                self.llm.base_url = url;
            }
        }
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("DOCUSEARCH_LLM_MODEL") {
            self.llm.model = model;
        }
    }

    /// Check invariants the engine relies on
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".to_string()));
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }

        let retrieval = &self.retrieval;
        if !(0.0..=1.0).contains(&retrieval.lambda) {
            return Err(Error::Config(format!(
                "retrieval.lambda must be within [0, 1], got {}",
                retrieval.lambda
            )));
        }
        if retrieval.fetch_multiplier == 0 {
            return Err(Error::Config("retrieval.fetch_multiplier must be at least 1".to_string()));
        }
        if retrieval.max_k == 0 || retrieval.default_k == 0 || retrieval.default_k > retrieval.max_k {
            return Err(Error::Config(format!(
                "retrieval.default_k ({}) must be within [1, {}]",
                retrieval.default_k, retrieval.max_k
            )));
        }

        if self.llm.backend == LlmBackend::Groq {
            let key = self.llm.api_key.as_deref().unwrap_or("");
            validate_api_key(key)?;
        }

        Ok(())
    }

    /// Directory holding the per-workspace index files
    pub fn workspaces_dir(&self) -> PathBuf {
        self.storage.data_dir.join("workspaces")
    }
}

/// Sanity checks for a Groq API key
fn validate_api_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::Config(
            "GROQ_API_KEY is not set (add GROQ_API_KEY=gsk_... to .env)".to_string(),
        ));
    }
    if key.trim() != key {
        return Err(Error::Config("API key has leading or trailing whitespace".to_string()));
    }
    if key.chars().any(|c| c.is_control()) {
        return Err(Error::Config("API key contains control characters".to_string()));
    }
    let len = key.chars().count();
    if !(20..=500).contains(&len) {
        return Err(Error::Config(format!(
            "API key length {} is outside the expected 20-500 characters",
            len
        )));
    }
    if !key.starts_with("gsk_") {
        tracing::warn!("API key does not start with 'gsk_'; Groq keys normally do");
    }
    Ok(())
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum size of one uploaded file in bytes
    pub max_file_size: usize,
    /// Maximum size of all files in one upload request
    pub max_total_upload: usize,
    /// Timeout for answering a question
    pub query_timeout_secs: u64,
    /// Timeout for ingesting and indexing one upload request
    pub ingest_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_file_size: 25 * 1024 * 1024,     // 25MB
            max_total_upload: 200 * 1024 * 1024, // 200MB
            query_timeout_secs: 120,
            ingest_timeout_secs: 600,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 300,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Sources retrieved when the caller does not ask for a number
    pub default_k: usize,
    /// Upper bound on sources per question
    pub max_k: usize,
    /// Candidate pool size is `k * fetch_multiplier` in diversity mode
    pub fetch_multiplier: usize,
    /// Relevance/diversity blend (1.0 = pure relevance)
    pub lambda: f32,
    /// Characters of chunk text shown in each source preview
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: 4,
            max_k: 10,
            fetch_multiplier: 3,
            lambda: 0.7,
            preview_chars: 200,
        }
    }
}

/// Embedding service (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Which completion service answers questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Groq OpenAI-compatible chat completions
    #[default]
    Groq,
    /// Local Ollama server
    Ollama,
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend provider
    #[serde(default)]
    pub backend: LlmBackend,
    /// API base URL
    pub base_url: String,
    /// API key (Groq only); never serialized
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Generation model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens in the answer
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Groq,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.1,  // Low for factual answers
            max_tokens: 2048,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for index files
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
            .join("docusearch");

        Self { data_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama_config() -> RagConfig {
        let mut config = RagConfig::default();
        config.llm.backend = LlmBackend::Ollama;
        config
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(ollama_config().validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut config = ollama_config();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_lambda_range() {
        let mut config = ollama_config();
        config.retrieval.lambda = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_groq_requires_key() {
        let mut config = RagConfig::default();
        assert!(config.validate().is_err());

        config.llm.api_key = Some(" gsk_0123456789abcdefghij".to_string());
        assert!(config.validate().is_err());

        config.llm.api_key = Some("gsk_0123456789abcdefghij".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: RagConfig = toml::from_str(
            r#"
            [chunking]
            chunk_size = 1000
            chunk_overlap = 200
            "#,
        )
        .unwrap();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.retrieval.fetch_multiplier, 3);
        assert_eq!(config.server.port, 8000);
    }
}
