//! Record store abstraction and factory.
//!
//! One row per (firm, industry). Writes are insert-or-skip, so re-running a
//! batch after a partial failure never duplicates or overwrites rows.

mod postgres;
mod sqlite;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

use crate::config::{ConfigError, StorageConfig};
use crate::firms::Firm;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

const TABLE: &str = "firm_theses";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS firm_theses (
    firm_id TEXT NOT NULL,
    name TEXT NOT NULL,
    website TEXT NOT NULL DEFAULT '',
    industry TEXT NOT NULL DEFAULT '',
    thesis TEXT NOT NULL DEFAULT '',
    country TEXT NOT NULL DEFAULT '',
    founded TEXT NOT NULL DEFAULT '',
    industry_tag TEXT NOT NULL DEFAULT '',
    linkedin_url TEXT NOT NULL DEFAULT '',
    locality TEXT NOT NULL DEFAULT '',
    region TEXT NOT NULL DEFAULT '',
    size TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (firm_id, industry)
)
"#;

const COLUMNS: &str = "firm_id, name, website, industry, thesis, country, founded, \
industry_tag, linkedin_url, locality, region, size";

/// One persisted row: a firm's metadata plus one industry and its thesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FirmRecord {
    pub firm_id: String,
    pub name: String,
    pub website: String,
    pub industry: String,
    pub thesis: String,
    pub country: String,
    pub founded: String,
    /// The firm list's own industry tag, unrelated to the extracted industry.
    pub industry_tag: String,
    pub linkedin_url: String,
    pub locality: String,
    pub region: String,
    pub size: String,
}

impl FirmRecord {
    pub fn new(firm: &Firm, industry: impl Into<String>, thesis: impl Into<String>) -> Self {
        let text = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();
        Self {
            firm_id: firm.id.trim().to_string(),
            name: firm.name.trim().to_string(),
            website: text(&firm.website),
            industry: industry.into(),
            thesis: thesis.into(),
            country: text(&firm.country),
            founded: text(&firm.founded),
            industry_tag: text(&firm.industry),
            linkedin_url: text(&firm.linkedin_url),
            locality: text(&firm.locality),
            region: text(&firm.region),
            size: text(&firm.size),
        }
    }

    /// Row for a firm where no industry was extracted.
    pub fn without_industry(firm: &Firm) -> Self {
        Self::new(firm, "", "")
    }
}

/// Persistent storage for extraction results.
///
/// Implementations open a connection per call and close it before
/// returning.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates the table. With `reset`, drops any existing table first.
    async fn init(&self, reset: bool) -> Result<()>;

    /// Inserts records, skipping any whose (firm, industry) key exists.
    ///
    /// A record that fails to insert is logged and skipped. Returns the
    /// number of rows actually inserted.
    async fn save_records(&self, records: &[FirmRecord]) -> Result<usize>;

    /// Number of stored rows.
    async fn count(&self) -> Result<i64>;

    /// All stored rows ordered by firm and industry.
    async fn records(&self) -> Result<Vec<FirmRecord>>;
}

/// Creates a record store for the configured backend.
pub fn create_record_store(config: &StorageConfig) -> Result<Arc<dyn RecordStore>> {
    match config {
        StorageConfig::Postgres { .. } => {
            let url = config.postgres_url()?;
            Ok(Arc::new(PostgresStore::new(url)))
        }
        StorageConfig::Sqlite { path } => Ok(Arc::new(SqliteStore::new(path.clone()))),
    }
}
