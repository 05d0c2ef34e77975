//! Crawler coordinator - one site's crawl end to end
//!
//! This module drives a single site through every stage:
//! - Compiling its rules (configuration errors surface here, before any request)
//! - Listing discovery with the site's strategy
//! - The fetch pool over discovered profile links
//! - Aggregation and hand-off to the record sink
//!
//! A discovery-fatal error does not fail the run: the links found before
//! it are still fetched and written, and the summary reports the halt.

use crate::config::{validate_site, DiscoveryConfig, HttpConfig, SiteConfig};
use crate::crawler::aggregate::aggregate;
use crate::crawler::browser::ChromiumDriver;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::interactive::{InteractiveDiscoverer, ListingDriver};
use crate::crawler::pool::FetchPool;
use crate::crawler::template::TemplateDiscoverer;
use crate::crawler::types::Discovery;
use crate::extract::FieldExtractors;
use crate::output::{CrawlEvent, CrawlSummary, EventSink, RecordSink};
use crate::{ConfigError, SweepError};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Crawls one site
pub struct Coordinator<'a> {
    site: &'a SiteConfig,
    http: &'a HttpConfig,
    client: Client,
    card_fields: FieldExtractors,
    detail_fields: Arc<FieldExtractors>,
}

impl<'a> Coordinator<'a> {
    /// Validates and compiles a site, and builds its HTTP session
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(SweepError::Config)` - Malformed site configuration
    pub fn new(site: &'a SiteConfig, http: &'a HttpConfig) -> Result<Self, SweepError> {
        validate_site(site)?;
        let card_fields = FieldExtractors::compile(&site.card_fields)?;
        let detail_fields = Arc::new(FieldExtractors::compile(&site.detail_fields)?);
        let client = build_http_client(http)?;

        Ok(Self {
            site,
            http,
            client,
            card_fields,
            detail_fields,
        })
    }

    fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.http.listing_timeout_secs)
    }

    fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.http.detail_timeout_secs)
    }

    /// Runs the crawl, launching a browser for interactive sites
    pub async fn run(
        &self,
        sink: &dyn RecordSink,
        events: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<CrawlSummary, SweepError> {
        let started = Instant::now();
        tracing::info!(site = %self.site.name, "Starting crawl");

        let discovery = match &self.site.discovery {
            DiscoveryConfig::Template(settings) => {
                let discoverer = TemplateDiscoverer::new(
                    self.site,
                    settings,
                    self.card_fields.clone(),
                    self.listing_timeout(),
                )?;
                discoverer.discover(&self.client, events, cancel).await
            }
            DiscoveryConfig::Interactive(settings) => {
                let discoverer = InteractiveDiscoverer::new(self.site, settings)?;
                match ChromiumDriver::launch(settings, &self.http.user_agent, self.listing_timeout())
                    .await
                {
                    Ok(driver) => discoverer.discover(driver, events, cancel).await,
                    Err(e @ SweepError::Config(_)) => return Err(e),
                    Err(e) => {
                        events.emit(CrawlEvent::DiscoveryHalted {
                            site: self.site.name.clone(),
                            page: 0,
                            error: e.to_string(),
                        });
                        Discovery {
                            halt_error: Some(e),
                            ..Discovery::default()
                        }
                    }
                }
            }
        };

        self.finish(started, discovery, sink, events, cancel).await
    }

    /// Runs an interactive site's crawl with a caller-supplied driver
    pub async fn run_with_driver<D: ListingDriver>(
        &self,
        driver: D,
        sink: &dyn RecordSink,
        events: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<CrawlSummary, SweepError> {
        let started = Instant::now();
        let DiscoveryConfig::Interactive(settings) = &self.site.discovery else {
            return Err(ConfigError::Validation(format!(
                "site '{}' does not use interactive discovery",
                self.site.name
            ))
            .into());
        };

        let discovery = InteractiveDiscoverer::new(self.site, settings)?
            .discover(driver, events, cancel)
            .await;

        self.finish(started, discovery, sink, events, cancel).await
    }

    async fn finish(
        &self,
        started: Instant,
        discovery: Discovery,
        sink: &dyn RecordSink,
        events: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<CrawlSummary, SweepError> {
        let mut summary = CrawlSummary::new(&self.site.name);
        summary.pages_visited = discovery.pages_visited;
        summary.links_discovered = discovery.links.len();
        summary.discovery_error = discovery.halt_error.as_ref().map(ToString::to_string);
        summary.cancelled = discovery.cancelled;

        tracing::info!(
            site = %self.site.name,
            pages = discovery.pages_visited,
            links = discovery.links.len(),
            inline = discovery.records.len(),
            "Discovery finished"
        );

        let mut records = discovery.records;
        if !discovery.links.is_empty() {
            let pool = FetchPool::new(
                &self.site.name,
                self.client.clone(),
                self.detail_fields.clone(),
                self.site.workers,
                self.detail_timeout(),
            );
            let outcome = pool.run(discovery.links, events, cancel).await;
            summary.fetch_failures = outcome.failures;
            summary.cancelled |= outcome.skipped > 0;
            records.extend(outcome.records);
        }
        summary.cancelled |= cancel.is_cancelled();

        let records = aggregate(records);
        let path = sink.write_records(&self.site.name, &records)?;

        summary.count = records.len();
        summary.output = Some(path);
        summary.elapsed_seconds = started.elapsed().as_secs_f64();

        events.emit(CrawlEvent::CrawlFinished {
            site: self.site.name.clone(),
            count: summary.count,
            elapsed_seconds: summary.elapsed_seconds,
        });

        Ok(summary)
    }
}

/// Crawls one site end to end and hands its records to `sink`
///
/// # Arguments
///
/// * `site` - The site to crawl
/// * `http` - Shared HTTP identity and timeouts
/// * `sink` - Receives the ordered records
/// * `events` - Receives progress events
/// * `cancel` - Stops discovery and pending fetches when triggered
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - The run completed, possibly partially
/// * `Err(SweepError)` - Configuration or output failure
pub async fn run_crawl(
    site: &SiteConfig,
    http: &HttpConfig,
    sink: &dyn RecordSink,
    events: &dyn EventSink,
    cancel: &CancellationToken,
) -> Result<CrawlSummary, SweepError> {
    Coordinator::new(site, http)?.run(sink, events, cancel).await
}
