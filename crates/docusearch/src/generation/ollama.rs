//! Ollama client for embeddings and completions, with retry logic

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LlmProvider};

use super::retry::{retry_request, RequestFailure};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Server base URL
    base_url: String,
    /// Maximum retries for transient failures
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: &str, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed one text with the given model
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let embedding = retry_request(self.max_retries, || {
            let request = EmbedRequest {
                model: model.to_string(),
                prompt: text.to_string(),
            };
            let request_builder = self.client.post(&url).json(&request);

            async move {
                let response = request_builder
                    .send()
                    .await
                    .map_err(|e| RequestFailure::from_reqwest("Embedding request failed", e))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(RequestFailure::from_status("Embedding failed", status, &body));
                }

                let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                    RequestFailure::fatal(format!("Failed to parse embedding response: {}", e))
                })?;

                Ok(embed_response.embedding)
            }
        })
        .await
        .map_err(|failure| Error::embedding(failure.message))?;

        Ok(embedding)
    }

    /// Complete a prompt with the given model
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        tracing::info!("Generating answer with model: {}", model);

        let answer = retry_request(self.max_retries, || {
            let request = GenerateRequest {
                model: model.to_string(),
                prompt: prompt.to_string(),
                stream: false,
                options: GenerateOptions {
                    temperature,
                    num_predict: max_tokens,
                },
            };
            let request_builder = self.client.post(&url).json(&request);

            async move {
                let response = request_builder
                    .send()
                    .await
                    .map_err(|e| RequestFailure::from_reqwest("Generation request failed", e))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(RequestFailure::from_status("Generation failed", status, &body));
                }

                let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                    RequestFailure::fatal(format!("Failed to parse generation response: {}", e))
                })?;

                Ok(generate_response.response)
            }
        })
        .await
        .map_err(|failure| Error::generation(failure.message))?;

        Ok(answer)
    }
}

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = OllamaClient::new(&config.base_url, config.timeout_secs, config.max_retries)?;
        Ok(Self::from_client(Arc::new(client), config))
    }

    /// Create from an existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            dimensions: config.dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = OllamaClient::new(&config.base_url, config.timeout_secs, config.max_retries)?;
        Ok(Self {
            client: Arc::new(client),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client
            .generate(&self.model, prompt, self.temperature, self.max_tokens)
            .await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
