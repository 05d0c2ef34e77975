//! Template-pagination discovery
//!
//! Walks `start-page..=max-pages` in order, one page at a time, and stops
//! on the first page with no cards. A listing fetch failure ends discovery
//! at the last good page; what was collected so far is kept.

use crate::config::{ListingMode, SiteConfig, TemplateDiscovery};
use crate::crawler::fetcher::fetch_page;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::ListingParser;
use crate::crawler::types::{Discovery, ListingPageRef};
use crate::extract::{parse_selector, FieldExtractors};
use crate::output::{CrawlEvent, EventSink};
use crate::url::listing_page_url;
use crate::SweepError;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Discovers profile links by expanding a page-number URL template
pub struct TemplateDiscoverer {
    site: String,
    settings: TemplateDiscovery,
    parser: ListingParser,
    base: Url,
    politeness_delay_ms: [u64; 2],
    timeout: Duration,
}

impl TemplateDiscoverer {
    /// Compiles a template site's listing settings
    ///
    /// # Arguments
    ///
    /// * `site` - The site configuration
    /// * `settings` - Its template discovery table
    /// * `card_fields` - Compiled card-level extractors
    /// * `timeout` - Per listing page request timeout
    pub fn new(
        site: &SiteConfig,
        settings: &TemplateDiscovery,
        card_fields: FieldExtractors,
        timeout: Duration,
    ) -> Result<Self, SweepError> {
        let card = parse_selector(&settings.card_selector)?;
        let link = settings
            .link_selector
            .as_deref()
            .map(parse_selector)
            .transpose()?;
        let inline = settings.mode == ListingMode::Inline;

        Ok(Self {
            site: site.name.clone(),
            settings: settings.clone(),
            parser: ListingParser::new(card, link, card_fields, inline),
            base: Url::parse(&site.base_url)?,
            politeness_delay_ms: site.politeness_delay_ms,
            timeout,
        })
    }

    /// The listing pages this discoverer would visit, in order
    pub fn pages(&self) -> impl Iterator<Item = ListingPageRef> + '_ {
        (self.settings.start_page..=self.settings.max_pages).map(move |page| ListingPageRef {
            site: self.site.clone(),
            page,
            url: listing_page_url(
                &self.settings.url_template,
                self.settings.first_page_url.as_deref(),
                page,
            ),
        })
    }

    /// Runs discovery to completion, halt or cancellation
    pub async fn discover(
        &self,
        client: &Client,
        events: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Discovery {
        let mut frontier = Frontier::new();
        let mut discovery = Discovery::default();

        for (index, page_ref) in self.pages().enumerate() {
            if index > 0 {
                let delay = politeness_delay(self.politeness_delay_ms);
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                tracing::info!(site = %self.site, page = page_ref.page, "Discovery cancelled");
                discovery.cancelled = true;
                break;
            }

            let body = match fetch_page(client, &page_ref.url, self.timeout).await {
                Ok(body) => body,
                Err(e) => {
                    events.emit(CrawlEvent::DiscoveryHalted {
                        site: self.site.clone(),
                        page: page_ref.page,
                        error: e.to_string(),
                    });
                    discovery.halt_error = Some(e);
                    break;
                }
            };

            let entries = self.parser.parse(&body, &self.base, page_ref.page);
            discovery.pages_visited += 1;

            if entries.cards == 0 {
                tracing::info!(
                    site = %self.site,
                    page = page_ref.page,
                    "No listing entries, end of directory"
                );
                break;
            }

            let found = entries.len();
            let new_links = frontier.extend(entries.links);
            discovery.records.extend(entries.records);

            events.emit(CrawlEvent::ListingPage {
                site: self.site.clone(),
                page: page_ref.page,
                entries: found,
                new_links,
                total_links: frontier.len() + discovery.records.len(),
            });
        }

        discovery.links = frontier.into_links();
        discovery
    }
}

/// Picks a uniformly random pause within `[min, max]` milliseconds
pub fn politeness_delay(window_ms: [u64; 2]) -> Duration {
    let [min, max] = window_ms;
    if min >= max {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}
