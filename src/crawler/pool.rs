//! Fetch pool
//!
//! Runs detail fetches for every discovered link with at most `workers` in
//! flight. Results are gathered in completion order. A failed or panicked
//! task is logged and left out; it never affects its siblings.

use crate::crawler::fetcher::fetch_detail;
use crate::crawler::types::{DetailRecord, ProfileLink};
use crate::extract::FieldExtractors;
use crate::output::{CrawlEvent, EventSink};
use crate::SweepError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Shared, immutable inputs of one pool run
#[derive(Clone)]
pub struct FetchPool {
    site: String,
    client: Client,
    extractors: Arc<FieldExtractors>,
    workers: usize,
    timeout: Duration,
}

/// What a pool run produced
#[derive(Debug, Default)]
pub struct PoolOutcome {
    /// Records in completion order
    pub records: Vec<DetailRecord>,

    /// Fetches that failed or panicked
    pub failures: usize,

    /// Links never fetched because the run was cancelled
    pub skipped: usize,
}

enum TaskResult {
    Fetched(DetailRecord),
    Failed { url: String, error: SweepError },
    Skipped,
}

impl FetchPool {
    pub fn new(
        site: &str,
        client: Client,
        extractors: Arc<FieldExtractors>,
        workers: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            site: site.to_string(),
            client,
            extractors,
            workers: workers.max(1),
            timeout,
        }
    }

    /// Fetches every link and collects the resulting records
    ///
    /// Once `cancel` fires, links still waiting for a worker are skipped;
    /// fetches already in flight finish normally.
    pub async fn run(
        &self,
        links: Vec<ProfileLink>,
        events: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> PoolOutcome {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        tracing::info!(
            site = %self.site,
            links = links.len(),
            workers = self.workers,
            "Dispatching detail fetches"
        );

        for link in links {
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            let client = self.client.clone();
            let extractors = self.extractors.clone();
            let timeout = self.timeout;

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return TaskResult::Skipped,
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return TaskResult::Skipped,
                    },
                };
                if cancel.is_cancelled() {
                    return TaskResult::Skipped;
                }

                match fetch_detail(&client, &link, &extractors, timeout).await {
                    Ok(record) => TaskResult::Fetched(record),
                    Err(error) => TaskResult::Failed {
                        url: link.url,
                        error,
                    },
                }
            });
        }

        let mut outcome = PoolOutcome::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(TaskResult::Fetched(record)) => {
                    events.emit(CrawlEvent::RecordFetched {
                        site: self.site.clone(),
                        page: record.source_page,
                        url: record.profile_url.clone(),
                        name: record.name.clone(),
                    });
                    outcome.records.push(record);
                }
                Ok(TaskResult::Failed { url, error }) => {
                    events.emit(CrawlEvent::FetchFailed {
                        site: self.site.clone(),
                        url,
                        error: error.to_string(),
                    });
                    outcome.failures += 1;
                }
                Ok(TaskResult::Skipped) => outcome.skipped += 1,
                Err(e) => {
                    tracing::error!(site = %self.site, error = %e, "Detail fetch task panicked");
                    events.emit(CrawlEvent::FetchFailed {
                        site: self.site.clone(),
                        url: String::new(),
                        error: e.to_string(),
                    });
                    outcome.failures += 1;
                }
            }
        }

        if outcome.skipped > 0 {
            tracing::info!(site = %self.site, skipped = outcome.skipped, "Skipped fetches after cancellation");
        }

        outcome
    }
}
