//! Single extraction worker for parallel runs.

use super::{FirmOutcome, Pipeline, RunSummary};
use crate::firms::Firm;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Message on the scrape → extract queue.
#[derive(Debug)]
pub enum WorkItem {
    /// A firm whose site dump is ready at `path`.
    Scraped { firm: Firm, path: PathBuf },
    /// No more work. Sent once, after every scrape has finished.
    Shutdown,
}

/// Drains the queue one firm at a time until the shutdown sentinel.
pub(crate) async fn run_worker(
    pipeline: Arc<Pipeline>,
    mut queue: mpsc::Receiver<WorkItem>,
) -> RunSummary {
    info!("Extraction worker started");
    let mut summary = RunSummary::default();

    loop {
        match queue.recv().await {
            Some(WorkItem::Scraped { firm, path }) => {
                let outcome = pipeline.process_scraped(&firm, &path).await;
                if let FirmOutcome::Failed(e) = &outcome {
                    error!(firm = %firm.name, error = %format!("{:#}", e), "Extraction failed");
                }
                summary.record(outcome);
            }
            Some(WorkItem::Shutdown) => {
                info!(processed = summary.firms, "Shutdown received, worker exiting");
                break;
            }
            None => {
                warn!("Queue closed without shutdown signal");
                break;
            }
        }
    }

    summary
}
