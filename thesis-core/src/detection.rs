//! Ollama availability detection and startup guidance.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Ollama is not reachable at {url}: {source}")]
    NotRunning {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Ollama at {url} answered with status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Failed to check Ollama status: {0}")]
    CheckFailed(String),
}

pub type Result<T> = std::result::Result<T, DetectionError>;

/// Information about a running Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaInfo {
    pub base_url: String,
    /// Locally available model names, e.g. `mistral:7b-instruct`.
    pub models: Vec<String>,
}

impl OllamaInfo {
    /// Whether `model` is pulled. A bare name matches its `:latest` tag.
    pub fn has_model(&self, model: &str) -> bool {
        self.models
            .iter()
            .any(|m| m == model || m.strip_suffix(":latest") == Some(model))
    }
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

/// Checks if Ollama is up and lists its models, printing startup help
/// when it is not.
///
/// # Example
///
/// ```no_run
/// # async fn demo() {
/// use thesis_core::detection;
///
/// match detection::detect_ollama("http://localhost:11434").await {
///     Ok(info) => println!("{} models available", info.models.len()),
///     Err(e) => eprintln!("Setup required: {}", e),
/// }
/// # }
/// ```
pub async fn detect_ollama(base_url: &str) -> Result<OllamaInfo> {
    let result = check_ollama_silent(base_url).await;
    if let Err(DetectionError::NotRunning { .. }) = &result {
        print_startup_help();
    }
    result
}

/// Quietly checks if Ollama is available without printing help messages.
///
/// Uses short timeouts so a dead endpoint fails fast.
pub async fn check_ollama_silent(base_url: &str) -> Result<OllamaInfo> {
    let base_url = base_url.trim_end_matches('/').to_string();
    let url = format!("{}/api/tags", base_url);

    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(TOTAL_TIMEOUT)
        .build()
        .map_err(|e| DetectionError::CheckFailed(e.to_string()))?;

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|source| DetectionError::NotRunning {
            url: url.clone(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(DetectionError::BadStatus {
            url,
            status: response.status().as_u16(),
        });
    }

    let tags: TagsResponse = response
        .json()
        .await
        .map_err(|e| DetectionError::CheckFailed(e.to_string()))?;

    Ok(OllamaInfo {
        base_url,
        models: tags.models.into_iter().map(|m| m.name).collect(),
    })
}

fn print_startup_help() {
    eprintln!("❌ Ollama is not running!");
    eprintln!();
    eprintln!("  Start Ollama:");

    #[cfg(target_os = "macos")]
    {
        eprintln!("   • Run the Ollama app from Applications");
        eprintln!("   • Or:  ollama serve  (in a separate terminal)");
    }

    #[cfg(not(target_os = "macos"))]
    {
        eprintln!("   ollama serve");
    }

    eprintln!();
    eprintln!("  Then pull the models used for extraction:");
    eprintln!("   ollama pull mistral:7b-instruct");
    eprintln!("   ollama pull all-minilm");
}
