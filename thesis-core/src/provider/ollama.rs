//! Ollama provider implementation.
//!
//! This module provides an Ollama HTTP API client that implements the Provider trait.

use super::types::*;
use crate::config::LlmConfig;
use async_trait::async_trait;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Ollama HTTP API provider.
///
/// Holds one `reqwest::Client` for the lifetime of the process; clone the
/// provider (or share it behind an `Arc`) instead of building new ones.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    http_client: reqwest::Client,
}

impl OllamaProvider {
    /// Creates a new Ollama provider from the LLM config.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.generate_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let ollama_request = OllamaGenerateRequest {
            model: request.model,
            prompt: request.prompt,
            stream: false,
            options: request.temperature.map(|t| {
                let mut opts = HashMap::new();
                opts.insert("temperature".to_string(), serde_json::json!(t));
                opts
            }),
        };

        debug!(model = %ollama_request.model, prompt_len = ollama_request.prompt.len(), "Sending generate request");

        let response = self
            .http_client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ProviderError::Api(error_text));
        }

        let generated = response.json::<OllamaGenerateResponse>().await?;
        Ok(generated.response)
    }

    async fn embed(&self, inputs: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);

        let embed_request = EmbedRequest {
            model: model.to_string(),
            input: inputs.to_vec(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&embed_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ProviderError::Api(error_text));
        }

        let embed_response = response.json::<EmbedResponse>().await?;

        if embed_response.embeddings.is_empty() && !inputs.is_empty() {
            return Err(ProviderError::Other("No embeddings returned".to_string()));
        }

        Ok(embed_response.embeddings)
    }
}

// Ollama-specific request/response types (internal)

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}
