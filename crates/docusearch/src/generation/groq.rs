//! Groq chat-completions client (OpenAI-compatible API)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::LlmProvider;

use super::retry::{retry_request, RequestFailure};

/// Groq LLM provider
pub struct GroqLlm {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
}

impl GroqLlm {
    /// Create a Groq provider; the API key must be present
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("GROQ_API_KEY is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

/// Pull the first choice's message text out of a chat-completions response
fn parse_completion(body: &Value) -> std::result::Result<String, RequestFailure> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RequestFailure::fatal("missing choices[0].message.content"))
}

#[async_trait]
impl LlmProvider for GroqLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(prompt);

        tracing::debug!("Groq request to {} with model {}", url, self.model);

        retry_request(self.max_retries, || {
            let request_builder = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body);

            async move {
                let response = request_builder
                    .send()
                    .await
                    .map_err(|e| RequestFailure::from_reqwest("Groq request failed", e))?;

                let status = response.status();
                match status {
                    StatusCode::UNAUTHORIZED => {
                        return Err(RequestFailure::fatal("Groq rejected the API key (HTTP 401)"))
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        return Err(RequestFailure::fatal("Groq rate limit exceeded (HTTP 429)"))
                    }
                    s if !s.is_success() => {
                        let text = response.text().await.unwrap_or_default();
                        return Err(RequestFailure::from_status("Groq request failed", s, &text));
                    }
                    _ => {}
                }

                let value: Value = response.json().await.map_err(|e| {
                    RequestFailure::fatal(format!("Failed to parse Groq response: {}", e))
                })?;

                parse_completion(&value)
            }
        })
        .await
        .map_err(|failure| Error::generation(failure.message))
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
            api_key: Some("gsk_0123456789abcdefghij".to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = LlmConfig::default();
        assert!(matches!(GroqLlm::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_request_body() {
        let llm = GroqLlm::new(&config()).unwrap();
        let body = llm.request_body("What is attention?");
        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "What is attention?");
        assert_eq!(body["max_tokens"], 2048);
    }

    #[test]
    fn test_parse_completion() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "It is [Source 1]." } }]
        });
        assert_eq!(parse_completion(&body).unwrap(), "It is [Source 1].");
        assert!(parse_completion(&json!({ "choices": [] })).is_err());
    }
}
