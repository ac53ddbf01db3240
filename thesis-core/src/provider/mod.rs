//! Model provider abstraction layer.
//!
//! This module defines a common interface for model backends so the ranker
//! and the extraction loop can run against Ollama in production and scripted
//! doubles in tests.

mod types;
pub mod ollama;

// Re-export common types
pub use types::{
    strip_thoughts,
    EmbedRequest,
    EmbedResponse,
    GenerateRequest,
    Provider,
    ProviderError,
    Result,
};

// Re-export provider implementations
pub use ollama::OllamaProvider;
