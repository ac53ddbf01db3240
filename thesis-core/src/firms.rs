//! Firm list loading.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FirmListError {
    #[error("Failed to read firm list: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, FirmListError>;

/// One row of the firm list. Only `id` and `name` are required; every
/// other column may be missing or empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firm {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub founded: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl Firm {
    /// US firm with a usable website.
    pub fn is_target(&self) -> bool {
        let us = self
            .country
            .as_deref()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case("united states"));
        let has_site = self.website.as_deref().is_some_and(|w| !w.trim().is_empty());
        us && has_site
    }

    /// Crawl start URL: the trimmed website, with `https://` added when no
    /// scheme is given.
    pub fn homepage(&self) -> Option<String> {
        let site = self.website.as_deref()?.trim();
        if site.is_empty() {
            return None;
        }
        if site.starts_with("http://") || site.starts_with("https://") {
            Some(site.to_string())
        } else {
            Some(format!("https://{}", site))
        }
    }
}

/// Reads the firm list and keeps US firms that have a website.
///
/// Rows that fail to deserialize are logged and skipped.
pub fn load_firms<P: AsRef<Path>>(path: P) -> Result<Vec<Firm>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)?;

    let mut total = 0usize;
    let mut firms = Vec::new();
    for row in reader.deserialize::<Firm>() {
        total += 1;
        match row {
            Ok(firm) if firm.is_target() => firms.push(firm),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping malformed firm row"),
        }
    }

    info!(path = %path.display(), total, kept = firms.len(), "Loaded firm list");
    Ok(firms)
}
