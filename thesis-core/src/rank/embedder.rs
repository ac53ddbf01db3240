//! Embedding generation using model providers.
//!
//! This module converts chunk and query text into vectors through the
//! provider's embedding endpoint.

use crate::provider::{Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during embedding generation.
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// The provider API returned an error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The API response contained no embeddings.
    #[error("No embeddings returned")]
    NoEmbeddings,

    /// The provider returned a different number of vectors than inputs sent.
    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedderError>;

/// Generates vector embeddings for text using a provider embedding model.
///
/// Constructed once per process and shared; cloning only clones the `Arc`.
///
/// # Supported Models
///
/// Any embedding model the provider serves, for example:
/// - `all-minilm` - 384-dimensional, fast, the default
/// - `nomic-embed-text` - 768-dimensional, good general purpose
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, batch_size: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            batch_size: batch_size.max(1),
        }
    }

    /// Generates a vector embedding for a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .provider
            .embed(&[text.to_string()], &self.model)
            .await?;

        vectors.pop().ok_or(EmbedderError::NoEmbeddings)
    }

    /// Embeds many texts, sending at most `batch_size` per request.
    ///
    /// Vectors are returned in the same order as `texts`.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            debug!(batch = batch.len(), model = %self.model, "Embedding batch");
            let embedded = self.provider.embed(batch, &self.model).await?;
            if embedded.len() != batch.len() {
                return Err(EmbedderError::CountMismatch {
                    expected: batch.len(),
                    actual: embedded.len(),
                });
            }
            vectors.extend(embedded);
        }

        Ok(vectors)
    }
}
