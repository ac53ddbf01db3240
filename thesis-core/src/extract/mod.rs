//! Model-backed extraction of industries and theses.
//!
//! Drafts go through a draft-and-grade loop: every attempt asks the model
//! for a fresh draft, then asks it again to grade that draft. Only a grade
//! of exactly `1` is accepted. When all attempts are rejected the loop
//! returns an empty string, which callers treat as "nothing extracted".

mod grade;
mod parse;
pub mod prompts;

pub use grade::{extract_first_int, Grade};
pub use parse::{extract_industries, extract_thesis};

use crate::config::{ExtractionConfig, LlmConfig};
use crate::provider::{strip_thoughts, GenerateRequest, Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Model call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Could not parse grade: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Runs prompts against the generation model.
#[derive(Clone)]
pub struct Extractor {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: Option<f64>,
    max_attempts: usize,
}

impl Extractor {
    pub fn new(provider: Arc<dyn Provider>, llm: &LlmConfig, extraction: &ExtractionConfig) -> Self {
        Self {
            provider,
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_attempts: extraction.max_attempts,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// One blocking model call, with any reasoning preamble removed.
    pub async fn complete(&self, prompt: String) -> Result<String> {
        let request =
            GenerateRequest::new(self.model.clone(), prompt).with_temperature(self.temperature);
        let response = self.provider.generate(request).await?;
        Ok(strip_thoughts(&response).to_string())
    }

    /// Drafts with `prompt_builder` and grades each draft with
    /// `grade_builder` until a draft is accepted or attempts run out.
    ///
    /// Returns the accepted draft, or `""` when every draft was rejected.
    ///
    /// # Errors
    ///
    /// A failed model call or a grading response without an integer ends
    /// the loop immediately with an error.
    pub async fn extract_with_validation<P, G>(
        &self,
        prompt_builder: P,
        grade_builder: G,
    ) -> Result<String>
    where
        P: Fn() -> String,
        G: Fn(&str) -> String,
    {
        for attempt in 1..=self.max_attempts {
            debug!(attempt, "Drafting");
            let draft = self.complete(prompt_builder()).await?;

            let verdict = self.complete(grade_builder(&draft)).await?;
            match Grade::parse(&verdict)? {
                Grade::Accept => {
                    info!(attempt, "Draft accepted");
                    return Ok(draft);
                }
                Grade::Reject(grade) => {
                    debug!(attempt, grade, "Draft rejected");
                }
            }
        }

        warn!(attempts = self.max_attempts, "No draft accepted");
        Ok(String::new())
    }

    /// Validated industry list for the ranked context of one firm.
    pub async fn industries_for(&self, context: &str) -> Result<Vec<String>> {
        let accepted = self
            .extract_with_validation(|| prompts::industry_prompt(context), prompts::grade_prompt)
            .await?;
        Ok(extract_industries(&accepted))
    }

    /// Verbatim thesis for one industry, or `""`.
    pub async fn thesis_for(&self, industry: &str, context: &str) -> Result<String> {
        let raw = self
            .complete(prompts::thesis_prompt(industry, context))
            .await?;
        Ok(extract_thesis(&raw))
    }
}
