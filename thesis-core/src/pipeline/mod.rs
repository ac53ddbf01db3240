//! End-to-end batch processing of a firm list.
//!
//! Per firm: crawl the site, chunk and dedup the dump, rank for the general
//! query, extract a validated industry list, then rank and extract a thesis
//! for each industry, and persist one record per industry.
//!
//! # Scheduling
//!
//! - Sequential: each firm runs end to end before the next starts.
//! - Parallel: crawls run concurrently and push onto a bounded queue; one
//!   worker drains it so model calls never overlap.

mod worker;

pub use worker::WorkItem;

use crate::config::Config;
use crate::crawler::{remove_dump, HttpCrawler, SiteCrawler};
use crate::extract::Extractor;
use crate::firms::Firm;
use crate::provider::{OllamaProvider, Provider};
use crate::rank::{chunk, dedup, join_chunks, Chunk, Embedder, Ranker};
use crate::store::{create_record_store, FirmRecord, RecordStore};
use anyhow::{anyhow, Context};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Result of processing one firm.
#[derive(Debug)]
pub enum FirmOutcome {
    /// Records were handed to the store; the count is rows newly inserted.
    Saved(usize),
    Failed(anyhow::Error),
}

/// Totals for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub firms: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records_saved: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: FirmOutcome) {
        self.firms += 1;
        match outcome {
            FirmOutcome::Saved(saved) => {
                self.succeeded += 1;
                self.records_saved += saved;
            }
            FirmOutcome::Failed(_) => self.failed += 1,
        }
    }

    fn merge(&mut self, other: RunSummary) {
        self.firms += other.firms;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.records_saved += other.records_saved;
    }
}

pub struct Pipeline {
    crawler: Arc<dyn SiteCrawler>,
    ranker: Ranker,
    extractor: Extractor,
    store: Arc<dyn RecordStore>,
    config: Config,
}

impl Pipeline {
    pub fn new(
        crawler: Arc<dyn SiteCrawler>,
        ranker: Ranker,
        extractor: Extractor,
        store: Arc<dyn RecordStore>,
        config: Config,
    ) -> Self {
        Self {
            crawler,
            ranker,
            extractor,
            store,
            config,
        }
    }

    /// Wires the Ollama provider, HTTP crawler and configured store.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let provider: Arc<dyn Provider> = Arc::new(
            OllamaProvider::new(&config.llm).context("Failed to create model client")?,
        );
        let embedder = Embedder::new(
            Arc::clone(&provider),
            config.embedding.model.clone(),
            config.embedding.batch_size,
        );
        let crawler =
            HttpCrawler::new(config.crawler.clone()).context("Failed to create crawler")?;
        let store = create_record_store(&config.storage).context("Failed to open record store")?;
        let extractor = Extractor::new(provider, &config.llm, &config.extraction);

        Ok(Self::new(
            Arc::new(crawler),
            Ranker::new(embedder),
            extractor,
            store,
            config,
        ))
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Processes every firm in the configured scheduling mode.
    ///
    /// Per-firm failures are logged and counted; they never stop the batch.
    ///
    /// # Errors
    ///
    /// Fails only when the batch itself could not complete, such as the
    /// extraction worker dying.
    pub async fn run(self: Arc<Self>, firms: Vec<Firm>) -> anyhow::Result<RunSummary> {
        info!(
            firms = firms.len(),
            parallel = self.config.pipeline.parallel,
            "Starting batch"
        );

        let summary = if self.config.pipeline.parallel {
            self.run_parallel(firms).await?
        } else {
            self.run_sequential(&firms).await
        };

        info!(
            firms = summary.firms,
            succeeded = summary.succeeded,
            failed = summary.failed,
            records = summary.records_saved,
            "Batch finished"
        );
        Ok(summary)
    }

    pub async fn run_sequential(&self, firms: &[Firm]) -> RunSummary {
        let mut summary = RunSummary::default();
        for firm in firms {
            let outcome = match self.scrape(firm).await {
                Ok(path) => self.process_scraped(firm, &path).await,
                Err(e) => FirmOutcome::Failed(e),
            };
            if let FirmOutcome::Failed(e) = &outcome {
                error!(firm = %firm.name, error = %format!("{:#}", e), "Firm failed");
            }
            summary.record(outcome);
        }
        summary
    }

    /// Concurrent crawls feeding a single extraction worker.
    pub async fn run_parallel(self: Arc<Self>, firms: Vec<Firm>) -> anyhow::Result<RunSummary> {
        let capacity = self.config.pipeline.queue_capacity.max(1);
        let concurrency = self.scrape_concurrency();
        let (tx, rx) = mpsc::channel(capacity);

        let worker = tokio::spawn(worker::run_worker(Arc::clone(&self), rx));
        info!(concurrency, capacity, "Scraping in parallel");

        let mut scrape_summary = RunSummary::default();
        let failures = stream::iter(firms)
            .map(|firm| {
                let pipeline = Arc::clone(&self);
                let tx = tx.clone();
                async move {
                    match pipeline.scrape(&firm).await {
                        Ok(path) => {
                            info!(firm = %firm.name, "Queued for extraction");
                            if tx.send(WorkItem::Scraped { firm, path }).await.is_err() {
                                warn!("Extraction worker is gone, dropping scraped firm");
                            }
                            None
                        }
                        Err(e) => {
                            error!(firm = %firm.name, error = %format!("{:#}", e), "Scrape failed");
                            Some(e)
                        }
                    }
                }
            })
            .buffer_unordered(concurrency)
            .filter_map(|failure| async move { failure })
            .collect::<Vec<_>>()
            .await;

        for failure in failures {
            scrape_summary.record(FirmOutcome::Failed(failure));
        }

        if tx.send(WorkItem::Shutdown).await.is_err() {
            warn!("Extraction worker exited before shutdown");
        }
        drop(tx);

        let mut summary = worker
            .await
            .map_err(|e| anyhow!("Extraction worker panicked: {}", e))?;
        summary.merge(scrape_summary);
        Ok(summary)
    }

    fn scrape_concurrency(&self) -> usize {
        self.config
            .pipeline
            .scrape_concurrency
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    /// Crawls a firm's website.
    pub async fn scrape(&self, firm: &Firm) -> anyhow::Result<PathBuf> {
        let url = firm
            .homepage()
            .ok_or_else(|| anyhow!("firm {} has no website", firm.id))?;
        info!(firm = %firm.name, url = %url, "Visiting");
        self.crawler
            .crawl(&firm.id, &url)
            .await
            .with_context(|| format!("crawling {}", url))
    }

    /// Ranks, extracts and persists a scraped firm, then removes the dump
    /// unless pages are kept.
    pub async fn process_scraped(&self, firm: &Firm, path: &Path) -> FirmOutcome {
        let result = self.extract_and_save(firm, path).await;
        if !self.config.crawler.keep_pages {
            remove_dump(path).await;
        }
        match result {
            Ok(saved) => FirmOutcome::Saved(saved),
            Err(e) => FirmOutcome::Failed(e),
        }
    }

    async fn extract_and_save(&self, firm: &Firm, path: &Path) -> anyhow::Result<usize> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let chunks = dedup(chunk(text.lines()));

        let records = self.analyze(firm, &chunks).await?;
        let saved = self
            .store
            .save_records(&records)
            .await
            .context("saving records")?;

        info!(firm = %firm.name, records = records.len(), saved, "Saved to database");
        Ok(saved)
    }

    /// Produces the records for one firm from its deduplicated chunks.
    pub async fn analyze(&self, firm: &Firm, chunks: &[Chunk]) -> anyhow::Result<Vec<FirmRecord>> {
        if chunks.is_empty() {
            warn!(firm = %firm.name, "No text to analyze");
            return Ok(vec![FirmRecord::without_industry(firm)]);
        }

        let ranking = &self.config.ranking;
        let general = self
            .ranker
            .rank_general(chunks, ranking)
            .await
            .context("ranking for industries")?;
        let industries = self
            .extractor
            .industries_for(&join_chunks(&general))
            .await
            .context("extracting industries")?;

        warn_on_repeats(&firm.name, &industries);
        if industries.is_empty() {
            info!(firm = %firm.name, "No industries extracted");
            return Ok(vec![FirmRecord::without_industry(firm)]);
        }

        let mut records = Vec::with_capacity(industries.len());
        for industry in &industries {
            let ranked = self
                .ranker
                .rank_for_industry(chunks, industry, ranking)
                .await
                .with_context(|| format!("ranking for {}", industry))?;
            let thesis = self
                .extractor
                .thesis_for(industry, &join_chunks(&ranked))
                .await
                .with_context(|| format!("extracting thesis for {}", industry))?;

            info!(firm = %firm.name, industry = %industry, found = !thesis.is_empty(), "Thesis extracted");
            records.push(FirmRecord::new(firm, industry.as_str(), thesis));
        }

        Ok(records)
    }
}

/// Repeated industries are kept; the store keeps the first row per key.
fn warn_on_repeats(firm: &str, industries: &[String]) {
    let mut seen = HashSet::new();
    for industry in industries {
        if !seen.insert(industry.as_str()) {
            warn!(firm = %firm, industry = %industry, "Industry listed more than once");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{dump_path, site_of, CrawlError};
    use crate::testing::ScriptedProvider;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const SITE: &str = "Our Strategy\n\
We partner with founder-owned healthcare services companies to build lasting platforms.\n\
We also back vertical software businesses that serve those same providers nationwide.\n\
\n\
---PAGE BREAK---\n\
\n\
Contact\n\
Reach our deal team any time through the form on this page or by phone.\n\
Offices in Boston and Chicago serve clients across the whole United States.\n";

    /// Writes canned site text for known URLs, named like the HTTP crawler.
    struct FakeCrawler {
        dir: PathBuf,
        sites: HashMap<String, String>,
    }

    #[async_trait]
    impl SiteCrawler for FakeCrawler {
        async fn crawl(&self, key: &str, start_url: &str) -> crate::crawler::Result<PathBuf> {
            let text = self
                .sites
                .get(start_url)
                .ok_or_else(|| CrawlError::NoPages(start_url.to_string()))?;
            let url = url::Url::parse(start_url).map_err(|source| CrawlError::InvalidUrl {
                url: start_url.to_string(),
                source,
            })?;
            let site = site_of(&url).ok_or_else(|| CrawlError::NoHost(start_url.to_string()))?;
            let path = dump_path(&self.dir, key, &site);
            tokio::fs::write(&path, text).await?;
            Ok(path)
        }
    }

    /// Insert-or-skip store held in memory.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<FirmRecord>>,
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn init(&self, reset: bool) -> crate::store::Result<()> {
            if reset {
                self.rows.lock().unwrap().clear();
            }
            Ok(())
        }

        async fn save_records(&self, records: &[FirmRecord]) -> crate::store::Result<usize> {
            let mut rows = self.rows.lock().unwrap();
            let mut saved = 0;
            for record in records {
                let exists = rows
                    .iter()
                    .any(|r| r.firm_id == record.firm_id && r.industry == record.industry);
                if !exists {
                    rows.push(record.clone());
                    saved += 1;
                }
            }
            Ok(saved)
        }

        async fn count(&self) -> crate::store::Result<i64> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }

        async fn records(&self) -> crate::store::Result<Vec<FirmRecord>> {
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    fn firm(id: &str, website: &str) -> Firm {
        Firm {
            id: id.into(),
            name: format!("Firm {}", id),
            website: Some(website.into()),
            country: Some("United States".into()),
            founded: None,
            industry: None,
            linkedin_url: None,
            locality: None,
            region: None,
            size: None,
        }
    }

    /// Answers by prompt kind: industries, grade, then thesis.
    fn model(industries: &'static str, grade: &'static str) -> ScriptedProvider {
        ScriptedProvider::default()
            .with_default_embedding(vec![1.0, 0.0])
            .with_responder(move |prompt| {
                if prompt.starts_with("List the industries") {
                    industries.to_string()
                } else if prompt.starts_with("You check whether") {
                    grade.to_string()
                } else if prompt.contains("INDUSTRY:\nHealthcare Services") {
                    r#"Investment Thesis: "[We partner with founder-owned healthcare services companies to build lasting platforms.]""#.to_string()
                } else {
                    r#""""#.to_string()
                }
            })
    }

    struct Harness {
        pipeline: Arc<Pipeline>,
        store: Arc<MemoryStore>,
        dir: tempfile::TempDir,
    }

    fn harness(provider: ScriptedProvider, sites: &[(&str, &str)], configure: impl FnOnce(&mut Config)) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let provider: Arc<dyn Provider> = Arc::new(provider);
        let mut config = Config::default();
        configure(&mut config);

        let crawler = FakeCrawler {
            dir: dir.path().to_path_buf(),
            sites: sites
                .iter()
                .map(|(url, text)| (url.to_string(), text.to_string()))
                .collect(),
        };
        let store = Arc::new(MemoryStore::default());
        let pipeline = Pipeline::new(
            Arc::new(crawler),
            Ranker::new(Embedder::new(Arc::clone(&provider), "embed", 64)),
            Extractor::new(provider, &config.llm, &config.extraction),
            Arc::clone(&store) as Arc<dyn RecordStore>,
            config,
        );

        Harness {
            pipeline: Arc::new(pipeline),
            store,
            dir,
        }
    }

    fn dumps_left(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_sequential_run_saves_one_row_per_industry() {
        let h = harness(
            model("[Healthcare Services]\n[No industry stated]\n[Software]", "1"),
            &[("https://alpha.com", SITE)],
            |_| {},
        );
        let firms = vec![firm("1", "alpha.com"), firm("2", "unreachable.com")];

        let summary = Arc::clone(&h.pipeline).run(firms).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                firms: 2,
                succeeded: 1,
                failed: 1,
                records_saved: 2
            }
        );
        let rows = h.store.records().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].industry, "Healthcare Services");
        assert_eq!(
            rows[0].thesis,
            "We partner with founder-owned healthcare services companies to build lasting platforms."
        );
        assert_eq!(rows[1].industry, "Software");
        assert_eq!(rows[1].thesis, "");
        assert_eq!(dumps_left(&h.dir), 0);
    }

    #[tokio::test]
    async fn test_rejected_drafts_store_an_empty_row() {
        let h = harness(model("[Healthcare Services]", "-1"), &[("https://alpha.com", SITE)], |_| {});

        let summary = Arc::clone(&h.pipeline)
            .run(vec![firm("1", "alpha.com")])
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1);
        let rows = h.store.records().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].industry, "");
        assert_eq!(rows[0].thesis, "");
    }

    #[tokio::test]
    async fn test_unparseable_grade_fails_the_firm() {
        let h = harness(
            model("[Healthcare Services]", "looks good"),
            &[("https://alpha.com", SITE)],
            |_| {},
        );

        let summary = Arc::clone(&h.pipeline)
            .run(vec![firm("1", "alpha.com")])
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(h.store.count().await.unwrap(), 0);
        assert_eq!(dumps_left(&h.dir), 0);
    }

    #[tokio::test]
    async fn test_parallel_run_processes_every_firm() {
        let sites: Vec<(String, &str)> = (1..=6)
            .map(|i| (format!("https://firm{}.com", i), SITE))
            .collect();
        let site_refs: Vec<(&str, &str)> = sites.iter().map(|(u, t)| (u.as_str(), *t)).collect();
        let h = harness(model("[Healthcare Services]", "1"), &site_refs, |config| {
            config.pipeline.parallel = true;
            config.pipeline.queue_capacity = 2;
            config.pipeline.scrape_concurrency = Some(3);
        });
        let mut firms: Vec<Firm> = (1..=6)
            .map(|i| firm(&i.to_string(), &format!("firm{}.com", i)))
            .collect();
        firms.push(firm("7", "missing.com"));

        let summary = Arc::clone(&h.pipeline).run(firms).await.unwrap();

        assert_eq!(summary.firms, 7);
        assert_eq!(summary.succeeded, 6);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.records_saved, 6);
        assert_eq!(dumps_left(&h.dir), 0);
    }

    #[tokio::test]
    async fn test_parallel_firms_on_one_domain_keep_their_own_text() {
        const FREIGHT: &str = "Our Focus\n\
We acquire regional freight brokers and trucking fleets across the Midwest corridor.\n\
Each platform gains dispatch software and a national carrier network from day one.\n";
        let provider = ScriptedProvider::default()
            .with_default_embedding(vec![1.0, 0.0])
            .with_responder(|prompt| {
                if prompt.starts_with("List the industries") {
                    if prompt.contains("freight") {
                        "[Logistics]".to_string()
                    } else {
                        "[Healthcare Services]".to_string()
                    }
                } else if prompt.starts_with("You check whether") {
                    "1".to_string()
                } else {
                    r#""""#.to_string()
                }
            });
        let h = harness(
            provider,
            &[("https://alpha.com", SITE), ("https://www.alpha.com/fund", FREIGHT)],
            |config| {
                config.pipeline.parallel = true;
                config.pipeline.scrape_concurrency = Some(2);
            },
        );
        let firms = vec![firm("1", "alpha.com"), firm("2", "www.alpha.com/fund")];

        let summary = Arc::clone(&h.pipeline).run(firms).await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
        let mut rows: Vec<(String, String)> = h
            .store
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.firm_id, r.industry))
            .collect();
        rows.sort();
        assert_eq!(
            rows,
            vec![
                ("1".to_string(), "Healthcare Services".to_string()),
                ("2".to_string(), "Logistics".to_string()),
            ]
        );
        assert_eq!(dumps_left(&h.dir), 0);
    }

    #[tokio::test]
    async fn test_keep_pages_leaves_dump() {
        let h = harness(model("[Healthcare Services]", "1"), &[("https://alpha.com", SITE)], |config| {
            config.crawler.keep_pages = true;
        });

        Arc::clone(&h.pipeline)
            .run(vec![firm("1", "alpha.com")])
            .await
            .unwrap();

        assert_eq!(dumps_left(&h.dir), 1);
    }

    #[tokio::test]
    async fn test_empty_dump_skips_the_model() {
        let provider = ScriptedProvider::default();
        let prompts = provider.prompts();
        let h = harness(provider, &[("https://alpha.com", "\n---PAGE BREAK---\n\n")], |_| {});

        let summary = Arc::clone(&h.pipeline)
            .run(vec![firm("1", "alpha.com")])
            .await
            .unwrap();

        assert_eq!(summary.records_saved, 1);
        assert!(prompts.lock().unwrap().is_empty());
    }
}
