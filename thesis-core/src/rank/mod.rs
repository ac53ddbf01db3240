//! Relevance ranking of crawled text.
//!
//! Turns a noisy multi-page crawl dump into a short list of passages worth
//! showing to the model.
//!
//! # Pipeline
//!
//! 1. [`chunk`] splits the dump along blank lines and page breaks
//! 2. [`dedup`] drops repeated boilerplate, keeping first occurrences
//! 3. [`NoiseFilter`] discards short, sparse or all-caps chunks
//! 4. [`Ranker`] embeds the survivors and the query, scores each chunk by
//!    cosine similarity plus an additive keyword boost, and keeps the top k
//!
//! The boost is additive rather than multiplicative so scores stay on the
//! cosine scale and a keyword hit cannot outweigh a large semantic gap.

mod chunker;
mod embedder;
mod noise;
mod types;

pub use chunker::{chunk, dedup};
pub use embedder::{Embedder, EmbedderError};
pub use noise::NoiseFilter;
pub use types::{join_chunks, Chunk, ScoredChunk, PAGE_BREAK};

use crate::config::RankingConfig;
use crate::patterns::mentions;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("Embedder error: {0}")]
    Embedder(#[from] EmbedderError),
}

pub type Result<T> = std::result::Result<T, RankError>;

/// Query for the general pass: which industries and investment model.
pub const GENERAL_QUERY: &str = "Our private equity firm focuses on specific industries, \
employs an investment model such as buy-and-build or growth equity, and follows clear \
investment thesis statements for value creation.";

/// Query for the thesis pass of one industry.
pub fn thesis_query(industry: &str) -> String {
    format!("What is the investment thesis for {}?", industry)
}

/// What earns a chunk the additive boost.
#[derive(Debug, Clone, Copy)]
pub enum Boost<'a> {
    /// Any of these terms appears in the chunk.
    Keywords(&'a [String]),
    /// The target industry name appears in the chunk.
    Industry(&'a str),
}

impl Boost<'_> {
    fn applies_to(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        match self {
            Boost::Keywords(terms) => terms
                .iter()
                .any(|term| mentions(&text, &term.to_lowercase())),
            Boost::Industry(industry) => mentions(&text, &industry.trim().to_lowercase()),
        }
    }
}

/// Parameters of one ranking pass.
#[derive(Debug, Clone, Copy)]
pub struct RankOptions {
    pub top_k: usize,
    pub boost_weight: f32,
    pub noise: NoiseFilter,
}

impl RankOptions {
    pub fn general(config: &RankingConfig) -> Self {
        Self {
            top_k: config.general_top_k,
            boost_weight: config.boost_weight,
            noise: config.general_noise,
        }
    }

    pub fn thesis(config: &RankingConfig) -> Self {
        Self {
            top_k: config.thesis_top_k,
            boost_weight: config.boost_weight,
            noise: config.thesis_noise,
        }
    }
}

/// Embedding-based chunk ranker.
#[derive(Clone)]
pub struct Ranker {
    embedder: Embedder,
}

impl Ranker {
    pub fn new(embedder: Embedder) -> Self {
        Self { embedder }
    }

    /// Ranks chunks against a query and returns at most `top_k` of them,
    /// best first.
    ///
    /// Noise is filtered before embedding. If that would leave nothing, the
    /// unfiltered chunks are ranked instead so a sparse site still yields
    /// candidates. Equal scores keep their input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedding provider fails.
    pub async fn rank(
        &self,
        chunks: &[Chunk],
        query: &str,
        options: &RankOptions,
        boost: Boost<'_>,
    ) -> Result<Vec<ScoredChunk>> {
        if chunks.is_empty() || options.top_k == 0 {
            return Ok(Vec::new());
        }

        let candidates = filter_noise(chunks, &options.noise);
        debug!(
            total = chunks.len(),
            kept = candidates.len(),
            "Noise filter applied"
        );

        let query_vec = self.embedder.embed(query).await?;
        let texts: Vec<String> = candidates.iter().map(|c| c.text().to_string()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let scored = candidates
            .into_iter()
            .zip(vectors.iter())
            .map(|(chunk, vector)| {
                let mut score = cosine_similarity(&query_vec, vector);
                if boost.applies_to(chunk.text()) {
                    score += options.boost_weight;
                }
                ScoredChunk {
                    chunk: chunk.clone(),
                    score,
                }
            })
            .collect();

        Ok(select_top(scored, options.top_k))
    }

    /// General pass: what industries does this firm invest in.
    pub async fn rank_general(
        &self,
        chunks: &[Chunk],
        config: &RankingConfig,
    ) -> Result<Vec<ScoredChunk>> {
        self.rank(
            chunks,
            GENERAL_QUERY,
            &RankOptions::general(config),
            Boost::Keywords(&config.boost_keywords),
        )
        .await
    }

    /// Thesis pass: what is the thesis for `industry`.
    pub async fn rank_for_industry(
        &self,
        chunks: &[Chunk],
        industry: &str,
        config: &RankingConfig,
    ) -> Result<Vec<ScoredChunk>> {
        self.rank(
            chunks,
            &thesis_query(industry),
            &RankOptions::thesis(config),
            Boost::Industry(industry),
        )
        .await
    }
}

fn filter_noise<'a>(chunks: &'a [Chunk], noise: &NoiseFilter) -> Vec<&'a Chunk> {
    let clean: Vec<&Chunk> = chunks.iter().filter(|c| !noise.is_noise(c.text())).collect();
    if clean.is_empty() {
        chunks.iter().collect()
    } else {
        clean
    }
}

/// Sorts by score, best first, and keeps `top_k`. The sort is stable.
fn select_top(mut scored: Vec<ScoredChunk>, top_k: usize) -> Vec<ScoredChunk> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    scored
}

/// Computes cosine similarity between two vectors.
///
/// Returns values from -1.0 (opposite) to 1.0 (identical), with 0.0 indicating
/// orthogonal vectors. Returns 0.0 for mismatched lengths or zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
