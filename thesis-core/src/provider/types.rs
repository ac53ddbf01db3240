//! Common types for model providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when interacting with a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Provider error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider trait for model backends.
///
/// Both calls are blocking from the caller's point of view: one prompt in,
/// one complete text out, and one vector per input for embeddings.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate a complete (non-streamed) answer for a prompt.
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// Embed each input, returning vectors in input order.
    async fn embed(&self, inputs: &[String], model: &str) -> Result<Vec<Vec<f32>>>;
}

/// Request for a single prompt completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub model: String,
    pub input: Vec<String>,
}

/// Response containing embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub embeddings: Vec<Vec<f32>>,
}

/// Drops a `<think>…</think>` preamble emitted by reasoning models.
pub fn strip_thoughts(text: &str) -> &str {
    match text.split_once("</think>") {
        Some((_, answer)) => answer.trim(),
        None => text.trim(),
    }
}
