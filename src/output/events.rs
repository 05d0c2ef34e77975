//! Structured progress events
//!
//! The crawl core reports progress as `CrawlEvent` values to an `EventSink`
//! and never prints directly.

use std::sync::{Mutex, PoisonError};

/// One observable step of a site's crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// A listing page was read
    ListingPage {
        site: String,
        page: u32,
        entries: usize,
        new_links: usize,
        total_links: usize,
    },

    /// Discovery stopped early on a fatal error
    DiscoveryHalted {
        site: String,
        page: u32,
        error: String,
    },

    /// A profile page produced a record
    RecordFetched {
        site: String,
        page: u32,
        url: String,
        name: String,
    },

    /// A profile page produced no record
    FetchFailed {
        site: String,
        url: String,
        error: String,
    },

    /// The site's crawl completed and its output was handed off
    CrawlFinished {
        site: String,
        count: usize,
        elapsed_seconds: f64,
    },
}

/// Receiver of crawl progress events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

/// Event sink that forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::ListingPage {
                site,
                page,
                entries,
                new_links,
                total_links,
            } => {
                tracing::info!(
                    site = %site,
                    page,
                    cards = entries,
                    new = new_links,
                    total = total_links,
                    "Listing page read"
                );
            }
            CrawlEvent::DiscoveryHalted { site, page, error } => {
                tracing::warn!(site = %site, page, error = %error, "Discovery halted");
            }
            CrawlEvent::RecordFetched {
                site,
                page,
                url,
                name,
            } => {
                tracing::debug!(site = %site, page, url = %url, name = %name, "Record fetched");
            }
            CrawlEvent::FetchFailed { site, url, error } => {
                tracing::warn!(site = %site, url = %url, error = %error, "Profile fetch failed");
            }
            CrawlEvent::CrawlFinished {
                site,
                count,
                elapsed_seconds,
            } => {
                tracing::info!(site = %site, count, elapsed_seconds, "Crawl finished");
            }
        }
    }
}

/// Event sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<CrawlEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events received so far
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Counts events matching a predicate
    pub fn count(&self, predicate: impl Fn(&CrawlEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: CrawlEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
