use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rank::NoiseFilter;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Missing database setting: {0}")]
    MissingDatabase(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for a full extraction run.
///
/// Every section falls back to its defaults, so a config file only needs the
/// values that differ from a local Ollama + Postgres setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub ranking: RankingConfig,
    pub extraction: ExtractionConfig,
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
}

/// Configuration for the generation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: Option<f64>,
    /// Upper bound on a single generation call. `None` waits indefinitely.
    pub generate_timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "mistral:7b-instruct".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: None,
            generate_timeout_secs: None,
        }
    }
}

/// Configuration for the embedding model used by the ranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Number of chunks sent per embedding request.
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-minilm".to_string(),
            batch_size: 64,
        }
    }
}

/// Configuration for chunk ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Chunks kept for the industry pass.
    pub general_top_k: usize,
    /// Chunks kept for each per-industry thesis pass.
    pub thesis_top_k: usize,
    /// Additive bonus for chunks that mention a boost term.
    pub boost_weight: f32,
    pub general_noise: NoiseFilter,
    pub thesis_noise: NoiseFilter,
    /// Terms that mark a chunk as likely to describe an investment focus.
    #[serde(default = "default_boost_keywords")]
    pub boost_keywords: Vec<String>,
}

fn default_boost_keywords() -> Vec<String> {
    crate::patterns::default_boost_keywords()
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            general_top_k: 10,
            thesis_top_k: 10,
            boost_weight: 0.2,
            general_noise: NoiseFilter::general(),
            thesis_noise: NoiseFilter::thesis(),
            boost_keywords: default_boost_keywords(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Draft attempts before the loop gives up with an empty answer.
    pub max_attempts: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Configuration for the site crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub max_pages: usize,
    /// Directory the raw page dumps are written to.
    pub output_dir: PathBuf,
    /// Links whose URL contains any of these strings are never followed.
    #[serde(default = "default_exclude_keywords")]
    pub exclude_keywords: Vec<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Keep the raw page dump after extraction instead of deleting it.
    pub keep_pages: bool,
}

fn default_exclude_keywords() -> Vec<String> {
    crate::patterns::default_exclude_keywords()
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 30,
            output_dir: PathBuf::from("./data/scraped_pages"),
            exclude_keywords: default_exclude_keywords(),
            request_timeout_secs: 20,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            keep_pages: false,
        }
    }
}

/// Record store backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Postgres server. When `url` is absent it is read from `DATABASE_URL`
    /// or assembled from the `PG_*` variables.
    Postgres {
        #[serde(default)]
        url: Option<String>,
    },
    /// Local SQLite file, created on first use.
    Sqlite { path: PathBuf },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Postgres { url: None }
    }
}

impl StorageConfig {
    /// Resolves the Postgres connection URL from config or environment.
    pub fn postgres_url(&self) -> Result<String> {
        match self {
            Self::Postgres { url: Some(url) } => Ok(url.clone()),
            Self::Postgres { url: None } => postgres_url_from_env(),
            Self::Sqlite { path } => Err(ConfigError::MissingDatabase(format!(
                "storage is sqlite ({})",
                path.display()
            ))),
        }
    }
}

fn postgres_url_from_env() -> Result<String> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Ok(url);
    }

    let var = |name: &str| {
        std::env::var(name).map_err(|_| ConfigError::MissingDatabase(name.to_string()))
    };
    let host = std::env::var("PG_HOST_local").or_else(|_| var("PG_HOST"))?;
    let port = std::env::var("PG_PORT").unwrap_or_else(|_| "5432".to_string());

    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        var("PG_USER")?,
        var("PG_PASSWORD")?,
        host,
        port,
        var("PG_DATABASE")?
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub firms_csv: PathBuf,
    /// Scrape firms concurrently and extract on a single worker.
    pub parallel: bool,
    /// Bound of the scrape → extract queue; producers wait when it is full.
    pub queue_capacity: usize,
    /// Concurrent scrapes in parallel mode. `None` uses available parallelism.
    pub scrape_concurrency: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            firms_csv: PathBuf::from("pefirms.csv"),
            parallel: false,
            queue_capacity: 100,
            scrape_concurrency: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `config.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Self {
        Self::load("config.yaml").unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "mistral:7b-instruct");
        assert_eq!(config.base_url, "http://localhost:11434");
        assert!(config.generate_timeout_secs.is_none());
    }

    #[test]
    fn test_ranking_config_defaults() {
        let config = RankingConfig::default();
        assert_eq!(config.general_top_k, 10);
        assert_eq!(config.thesis_top_k, 10);
        assert!((config.boost_weight - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.general_noise.min_words, 5);
        assert_eq!(config.thesis_noise.min_chars, 30);
        assert!(config.boost_keywords.iter().any(|k| k == "thesis"));
    }

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert!(!config.parallel);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(ExtractionConfig::default().max_attempts, 3);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
llm:
  model: mixtral
storage:
  backend: sqlite
  path: ./data/firms.db
pipeline:
  parallel: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.model, "mixtral");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert!(config.pipeline.parallel);
        assert_eq!(config.pipeline.queue_capacity, 100);
        assert_eq!(config.crawler.max_pages, 30);
        assert!(matches!(config.storage, StorageConfig::Sqlite { .. }));
    }

    #[test]
    fn test_explicit_postgres_url_wins() {
        let storage = StorageConfig::Postgres {
            url: Some("postgres://u:p@db:5432/firms".to_string()),
        };
        assert_eq!(storage.postgres_url().unwrap(), "postgres://u:p@db:5432/firms");
    }

    #[test]
    fn test_sqlite_has_no_postgres_url() {
        let storage = StorageConfig::Sqlite {
            path: PathBuf::from("firms.db"),
        };
        assert!(storage.postgres_url().is_err());
    }
}
