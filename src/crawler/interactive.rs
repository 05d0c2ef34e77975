//! Interactive-pagination discovery
//!
//! Some directories only paginate through a client-side "next" control.
//! The walk is a state machine over [`PaginationState`]:
//!
//! ```text
//! WaitListingLoaded -> ExtractLinks -> Advance -> ExtractLinks -> ... -> Done
//! ```
//!
//! `Advance` captures the first rendered listing element, clicks "next" and
//! waits for that element to go stale before the next extraction, so links
//! of a page that has not re-rendered yet are never read twice. A failed
//! click or a page that never goes stale is the end of the directory, not
//! an error. Only a listing that never renders in the first place halts
//! discovery.

use crate::config::{InteractiveDiscovery, SiteConfig};
use crate::crawler::frontier::Frontier;
use crate::crawler::types::{Discovery, ProfileLink};
use crate::output::{CrawlEvent, EventSink};
use crate::state::PaginationState;
use crate::url::canonicalize_link;
use crate::SweepError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Interval between DOM polls while waiting for render or staleness
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Browser capabilities the interactive discoverer needs
///
/// Implemented by the Chromium driver and by scripted drivers in tests.
#[async_trait]
pub trait ListingDriver: Send {
    /// Reference to one rendered element
    type Handle: Send + Sync;

    /// Loads the listing entry page
    async fn navigate(&mut self, url: &str) -> Result<(), SweepError>;

    /// The first element currently matching `selector`, if any
    async fn first_element(&mut self, selector: &str) -> Result<Option<Self::Handle>, SweepError>;

    /// Raw `href` values of every rendered element matching `selector`
    async fn extract_links(&mut self, selector: &str) -> Result<Vec<String>, SweepError>;

    /// Scrolls the first element matching `selector` into view and clicks it
    ///
    /// Returns false when there is no such element.
    async fn click_next(&mut self, selector: &str) -> Result<bool, SweepError>;

    /// Whether the element is no longer part of the rendered document
    async fn is_stale(&mut self, handle: &Self::Handle) -> Result<bool, SweepError>;

    /// Releases the browser
    async fn close(&mut self) -> Result<(), SweepError>;
}

/// Discovers profile links by clicking through a rendered listing
pub struct InteractiveDiscoverer {
    site: String,
    settings: InteractiveDiscovery,
    base: Url,
}

impl InteractiveDiscoverer {
    pub fn new(site: &SiteConfig, settings: &InteractiveDiscovery) -> Result<Self, SweepError> {
        Ok(Self {
            site: site.name.clone(),
            settings: settings.clone(),
            base: Url::parse(&site.base_url)?,
        })
    }

    fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.wait_timeout_secs)
    }

    fn advance_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.advance_timeout_secs)
    }

    /// Runs discovery to completion, halt or cancellation
    ///
    /// The driver is closed before returning, on every path.
    pub async fn discover<D: ListingDriver>(
        &self,
        mut driver: D,
        events: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Discovery {
        let discovery = self.walk(&mut driver, events, cancel).await;

        if let Err(e) = driver.close().await {
            tracing::warn!(site = %self.site, error = %e, "Failed to close browser");
        }

        discovery
    }

    async fn walk<D: ListingDriver>(
        &self,
        driver: &mut D,
        events: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Discovery {
        let mut frontier = Frontier::new();
        let mut discovery = Discovery::default();
        let mut state = PaginationState::WaitListingLoaded;
        let mut page: u32 = 1;

        if let Err(e) = driver.navigate(&self.settings.entry_url).await {
            self.halt(&mut discovery, events, page, e);
            return discovery;
        }

        while !state.is_terminal() {
            let next = match state {
                PaginationState::WaitListingLoaded => {
                    let timeout = self.wait_timeout();
                    match wait_for(driver, &self.settings.listing_marker, timeout).await {
                        Ok(true) => PaginationState::ExtractLinks,
                        Ok(false) => {
                            let e = SweepError::ListingTimeout {
                                marker: self.settings.listing_marker.clone(),
                                timeout,
                            };
                            self.halt(&mut discovery, events, page, e);
                            PaginationState::Done
                        }
                        Err(e) => {
                            self.halt(&mut discovery, events, page, e);
                            PaginationState::Done
                        }
                    }
                }
                PaginationState::ExtractLinks => match self.page_links(driver).await {
                    Ok(urls) => {
                        let found = urls.len();
                        let new_links = frontier
                            .extend(urls.into_iter().map(|url| ProfileLink::new(page, url)));
                        discovery.pages_visited += 1;
                        events.emit(CrawlEvent::ListingPage {
                            site: self.site.clone(),
                            page,
                            entries: found,
                            new_links,
                            total_links: frontier.len(),
                        });

                        if cancel.is_cancelled() {
                            tracing::info!(site = %self.site, page, "Discovery cancelled");
                            discovery.cancelled = true;
                            PaginationState::Done
                        } else if page >= self.settings.max_pages {
                            tracing::info!(site = %self.site, page, "Page cap reached");
                            PaginationState::Done
                        } else {
                            PaginationState::Advance
                        }
                    }
                    Err(e) => {
                        self.halt(&mut discovery, events, page, e);
                        PaginationState::Done
                    }
                },
                PaginationState::Advance => match self.advance(driver).await {
                    Ok(true) => {
                        page += 1;
                        PaginationState::ExtractLinks
                    }
                    Ok(false) => {
                        tracing::info!(site = %self.site, page, "No further listing pages");
                        PaginationState::Done
                    }
                    Err(e) => {
                        tracing::info!(
                            site = %self.site,
                            page,
                            error = %e,
                            "Next page unavailable, treating as last page"
                        );
                        PaginationState::Done
                    }
                },
                PaginationState::Done => PaginationState::Done,
            };

            if let Err(e) = transition(&mut state, next) {
                self.halt(&mut discovery, events, page, e);
                break;
            }
        }

        discovery.links = frontier.into_links();
        discovery
    }

    /// Reads the current page's profile links, first non-empty selector wins
    async fn page_links<D: ListingDriver>(&self, driver: &mut D) -> Result<Vec<String>, SweepError> {
        let mut hrefs = Vec::new();
        for selector in &self.settings.link_selectors {
            hrefs = driver.extract_links(selector).await?;
            if !hrefs.is_empty() {
                break;
            }
            tracing::debug!(site = %self.site, selector = %selector, "No links, trying next selector");
        }

        let mut seen = HashSet::new();
        let urls = hrefs
            .iter()
            .filter_map(|href| canonicalize_link(href, &self.base).ok())
            .filter(|url| seen.insert(url.clone()))
            .collect();
        Ok(urls)
    }

    /// Clicks "next" and waits for the old page to go stale and the new one to render
    async fn advance<D: ListingDriver>(&self, driver: &mut D) -> Result<bool, SweepError> {
        let timeout = self.advance_timeout();
        let old = driver.first_element(&self.settings.listing_marker).await?;

        if !driver.click_next(&self.settings.next_selector).await? {
            return Ok(false);
        }

        if let Some(old) = old {
            if !wait_stale(driver, &old, timeout).await? {
                tracing::debug!(site = %self.site, "Listing did not re-render after click");
                return Ok(false);
            }
        }

        wait_for(driver, &self.settings.listing_marker, timeout).await
    }

    fn halt(&self, discovery: &mut Discovery, events: &dyn EventSink, page: u32, error: SweepError) {
        events.emit(CrawlEvent::DiscoveryHalted {
            site: self.site.clone(),
            page,
            error: error.to_string(),
        });
        discovery.halt_error = Some(error);
    }
}

fn transition(state: &mut PaginationState, next: PaginationState) -> Result<(), SweepError> {
    if !state.can_transition_to(next) {
        return Err(SweepError::InvalidTransition {
            from: *state,
            to: next,
        });
    }
    tracing::trace!(from = %state, to = %next, "Pagination transition");
    *state = next;
    Ok(())
}

/// Polls until an element matching `selector` is rendered
///
/// Returns false if none appears within `timeout`.
pub async fn wait_for<D: ListingDriver>(
    driver: &mut D,
    selector: &str,
    timeout: Duration,
) -> Result<bool, SweepError> {
    let poll = async {
        loop {
            if driver.first_element(selector).await?.is_some() {
                return Ok::<(), SweepError>(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(result) => result.map(|()| true),
        Err(_) => Ok(false),
    }
}

/// Polls until `handle` no longer belongs to the rendered document
///
/// Returns false if it is still attached after `timeout`.
pub async fn wait_stale<D: ListingDriver>(
    driver: &mut D,
    handle: &D::Handle,
    timeout: Duration,
) -> Result<bool, SweepError> {
    let poll = async {
        loop {
            if driver.is_stale(handle).await? {
                return Ok::<(), SweepError>(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(result) => result.map(|()| true),
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiscoveryConfig, FieldRules};
    use crate::output::MemoryEventSink;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Scripted listing: each page is a list of hrefs; handles are render generations
    struct ScriptedDriver {
        pages: Vec<Vec<String>>,
        current: usize,
        generation: u64,
        marker_present: bool,
        rerenders: bool,
        fail_navigation: bool,
        click_error: bool,
        marker_gone_after_click: bool,
        closed: Arc<AtomicBool>,
    }

    impl ScriptedDriver {
        fn new(pages: Vec<Vec<&str>>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|p| p.into_iter().map(str::to_string).collect())
                    .collect(),
                current: 0,
                generation: 0,
                marker_present: true,
                rerenders: true,
                fail_navigation: false,
                click_error: false,
                marker_gone_after_click: false,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl ListingDriver for ScriptedDriver {
        type Handle = u64;

        async fn navigate(&mut self, _url: &str) -> Result<(), SweepError> {
            if self.fail_navigation {
                return Err(SweepError::Browser("net::ERR_NAME_NOT_RESOLVED".to_string()));
            }
            Ok(())
        }

        async fn first_element(&mut self, _selector: &str) -> Result<Option<u64>, SweepError> {
            Ok(self.marker_present.then_some(self.generation))
        }

        async fn extract_links(&mut self, selector: &str) -> Result<Vec<String>, SweepError> {
            if selector == "a.primary" {
                return Ok(self.pages[self.current].clone());
            }
            Ok(Vec::new())
        }

        async fn click_next(&mut self, _selector: &str) -> Result<bool, SweepError> {
            if self.current + 1 >= self.pages.len() {
                return Ok(false);
            }
            if self.click_error {
                return Err(SweepError::Browser("element is not clickable".to_string()));
            }
            if self.rerenders {
                self.current += 1;
                self.generation += 1;
            }
            if self.marker_gone_after_click {
                self.marker_present = false;
            }
            Ok(true)
        }

        async fn is_stale(&mut self, handle: &u64) -> Result<bool, SweepError> {
            Ok(*handle != self.generation)
        }

        async fn close(&mut self) -> Result<(), SweepError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn discoverer(link_selectors: &[&str], max_pages: u32) -> InteractiveDiscoverer {
        let settings = InteractiveDiscovery {
            entry_url: "https://www.example.com.tr/danismanlar".to_string(),
            listing_marker: "img.agent".to_string(),
            link_selectors: link_selectors.iter().map(|s| s.to_string()).collect(),
            next_selector: "a.next".to_string(),
            wait_timeout_secs: 1,
            advance_timeout_secs: 1,
            max_pages,
            headless: true,
            browser_path: None,
        };
        let site = SiteConfig {
            name: "interactive".to_string(),
            base_url: "https://www.example.com.tr".to_string(),
            workers: 2,
            politeness_delay_ms: [0, 0],
            discovery: DiscoveryConfig::Interactive(settings.clone()),
            card_fields: FieldRules::default(),
            detail_fields: FieldRules::default(),
        };
        InteractiveDiscoverer::new(&site, &settings).unwrap()
    }

    #[tokio::test]
    async fn test_walks_every_page_until_next_missing() {
        let driver = ScriptedDriver::new(vec![
            vec!["/d/1", "/d/2", "/d/2"],
            vec!["/d/3", "/d/1"],
            vec!["/d/4"],
        ]);
        let closed = driver.closed.clone();
        let events = MemoryEventSink::new();

        let discovery = discoverer(&["a.primary"], 100)
            .discover(driver, &events, &CancellationToken::new())
            .await;

        assert!(discovery.is_complete());
        assert_eq!(discovery.pages_visited, 3);
        let urls: Vec<(u32, &str)> = discovery
            .links
            .iter()
            .map(|l| (l.source_page, l.url.as_str()))
            .collect();
        assert_eq!(
            urls,
            vec![
                (1, "https://www.example.com.tr/d/1"),
                (1, "https://www.example.com.tr/d/2"),
                (2, "https://www.example.com.tr/d/3"),
                (3, "https://www.example.com.tr/d/4"),
            ]
        );
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_falls_back_to_later_link_selector() {
        let driver = ScriptedDriver::new(vec![vec!["/d/1"]]);
        let discovery = discoverer(&["div.missing a", "a.primary"], 100)
            .discover(driver, &MemoryEventSink::new(), &CancellationToken::new())
            .await;

        assert_eq!(discovery.links.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_listing_marker_halts_and_closes() {
        let mut driver = ScriptedDriver::new(vec![vec!["/d/1"]]);
        driver.marker_present = false;
        let closed = driver.closed.clone();
        let events = MemoryEventSink::new();

        let discovery = discoverer(&["a.primary"], 100)
            .discover(driver, &events, &CancellationToken::new())
            .await;

        assert!(matches!(
            discovery.halt_error,
            Some(SweepError::ListingTimeout { .. })
        ));
        assert!(discovery.links.is_empty());
        assert_eq!(
            events.count(|e| matches!(e, CrawlEvent::DiscoveryHalted { .. })),
            1
        );
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_no_staleness_ends_without_rereading_page() {
        let mut driver = ScriptedDriver::new(vec![vec!["/d/1", "/d/2"], vec!["/d/3"]]);
        driver.rerenders = false;

        let discovery = discoverer(&["a.primary"], 100)
            .discover(driver, &MemoryEventSink::new(), &CancellationToken::new())
            .await;

        assert!(discovery.is_complete());
        assert_eq!(discovery.pages_visited, 1);
        assert_eq!(discovery.links.len(), 2);
    }

    #[tokio::test]
    async fn test_click_error_ends_as_last_page() {
        let mut driver = ScriptedDriver::new(vec![vec!["/d/1", "/d/2"], vec!["/d/3"]]);
        driver.click_error = true;
        let closed = driver.closed.clone();
        let events = MemoryEventSink::new();

        let discovery = discoverer(&["a.primary"], 100)
            .discover(driver, &events, &CancellationToken::new())
            .await;

        assert!(discovery.is_complete());
        assert!(discovery.halt_error.is_none());
        assert_eq!(discovery.pages_visited, 1);
        assert!(discovery.links.iter().all(|l| l.source_page == 1));
        assert_eq!(discovery.links.len(), 2);
        assert_eq!(
            events.count(|e| matches!(e, CrawlEvent::DiscoveryHalted { .. })),
            0
        );
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_marker_missing_after_click_ends_as_last_page() {
        let mut driver = ScriptedDriver::new(vec![vec!["/d/1", "/d/2"], vec!["/d/3"]]);
        driver.marker_gone_after_click = true;

        let discovery = discoverer(&["a.primary"], 100)
            .discover(driver, &MemoryEventSink::new(), &CancellationToken::new())
            .await;

        assert!(discovery.is_complete());
        assert!(discovery.halt_error.is_none());
        assert_eq!(discovery.pages_visited, 1);
        let urls: Vec<&str> = discovery.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://www.example.com.tr/d/1", "https://www.example.com.tr/d/2"]
        );
    }

    #[tokio::test]
    async fn test_page_cap() {
        let driver = ScriptedDriver::new(vec![vec!["/d/1"], vec!["/d/2"], vec!["/d/3"]]);
        let discovery = discoverer(&["a.primary"], 2)
            .discover(driver, &MemoryEventSink::new(), &CancellationToken::new())
            .await;

        assert_eq!(discovery.pages_visited, 2);
        assert_eq!(discovery.links.len(), 2);
    }

    #[tokio::test]
    async fn test_navigation_failure_halts_and_closes() {
        let mut driver = ScriptedDriver::new(vec![vec!["/d/1"]]);
        driver.fail_navigation = true;
        let closed = driver.closed.clone();

        let discovery = discoverer(&["a.primary"], 100)
            .discover(driver, &MemoryEventSink::new(), &CancellationToken::new())
            .await;

        assert!(matches!(discovery.halt_error, Some(SweepError::Browser(_))));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancellation_stops_after_current_page() {
        let driver = ScriptedDriver::new(vec![vec!["/d/1"], vec!["/d/2"]]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let discovery = discoverer(&["a.primary"], 100)
            .discover(driver, &MemoryEventSink::new(), &cancel)
            .await;

        assert!(discovery.cancelled);
        assert_eq!(discovery.pages_visited, 1);
    }

    #[test]
    fn test_transition_rejects_illegal_step() {
        let mut state = PaginationState::WaitListingLoaded;
        assert!(transition(&mut state, PaginationState::ExtractLinks).is_ok());
        assert!(matches!(
            transition(&mut state, PaginationState::WaitListingLoaded),
            Err(SweepError::InvalidTransition { .. })
        ));
        assert_eq!(state, PaginationState::ExtractLinks);
    }
}
