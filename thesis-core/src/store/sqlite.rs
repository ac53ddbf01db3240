//! SQLite record store.
//!
//! A file-based backend for local runs and tests; the file is created on
//! first use.

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::{FirmRecord, RecordStore, Result, COLUMNS, CREATE_TABLE, TABLE};

pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);
        Ok(SqliteConnection::connect_with(&options).await?)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn init(&self, reset: bool) -> Result<()> {
        let mut conn = self.connect().await?;
        if reset {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", TABLE))
                .execute(&mut conn)
                .await?;
            info!(table = TABLE, path = %self.path.display(), "Dropped table");
        }
        sqlx::query(CREATE_TABLE).execute(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }

    async fn save_records(&self, records: &[FirmRecord]) -> Result<usize> {
        let mut conn = self.connect().await?;
        let insert = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (firm_id, industry) DO NOTHING",
            TABLE, COLUMNS
        );

        let mut saved = 0usize;
        for record in records {
            let result = sqlx::query(&insert)
                .bind(&record.firm_id)
                .bind(&record.name)
                .bind(&record.website)
                .bind(&record.industry)
                .bind(&record.thesis)
                .bind(&record.country)
                .bind(&record.founded)
                .bind(&record.industry_tag)
                .bind(&record.linkedin_url)
                .bind(&record.locality)
                .bind(&record.region)
                .bind(&record.size)
                .execute(&mut conn)
                .await;

            match result {
                Ok(done) if done.rows_affected() > 0 => saved += 1,
                Ok(_) => debug!(firm_id = %record.firm_id, industry = %record.industry, "Record exists, skipped"),
                Err(e) => warn!(firm_id = %record.firm_id, industry = %record.industry, error = %e, "Failed to save record"),
            }
        }

        conn.close().await?;
        Ok(saved)
    }

    async fn count(&self) -> Result<i64> {
        let mut conn = self.connect().await?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", TABLE))
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;
        Ok(count)
    }

    async fn records(&self) -> Result<Vec<FirmRecord>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query_as::<_, FirmRecord>(&format!(
            "SELECT {} FROM {} ORDER BY firm_id, industry",
            COLUMNS, TABLE
        ))
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;
        Ok(rows)
    }
}
