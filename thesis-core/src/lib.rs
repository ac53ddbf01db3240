//! thesis-core - Investment thesis extraction from private-equity websites
//!
//! Provides the building blocks for turning crawled firm websites into
//! stored (firm, industry, thesis) records:
//! - Relevance ranking of crawled text (chunking, dedup, noise filter, embeddings)
//! - Validated model extraction (draft-and-grade loop, strict-format parsers)
//! - Site crawling, firm list loading and record storage
//! - Configuration management
//!
//! ## Primary API
//!
//! Most callers build a [`Pipeline`] from a [`Config`] and run it over the
//! firms returned by [`load_firms`].

// Public modules
pub mod config;
pub mod crawler;
pub mod detection;
pub mod extract;
pub mod firms;
pub mod patterns;
pub mod pipeline;
pub mod provider;
pub mod rank;
pub mod store;

#[cfg(test)]
mod testing;

// Public exports
pub use config::{Config, StorageConfig};
pub use crawler::{CrawlError, HttpCrawler, SiteCrawler};
pub use detection::{check_ollama_silent, detect_ollama, DetectionError, OllamaInfo};
pub use extract::{extract_industries, extract_thesis, ExtractError, Extractor};
pub use firms::{load_firms, Firm, FirmListError};
pub use pipeline::{Pipeline, RunSummary};
pub use rank::{Chunk, RankError, Ranker, ScoredChunk};
pub use store::{create_record_store, FirmRecord, RecordStore, StoreError};

// Provider exports
pub use provider::{GenerateRequest, OllamaProvider, Provider, ProviderError};
