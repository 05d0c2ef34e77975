//! Crawler module for directory discovery and profile fetching
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with per-request timeouts
//! - Listing page parsing and the link frontier
//! - Template and interactive (browser-driven) pagination
//! - The bounded-concurrency fetch pool
//! - Aggregation and overall crawl coordination

mod aggregate;
mod browser;
mod coordinator;
mod fetcher;
mod frontier;
mod interactive;
mod parser;
mod pool;
mod template;
mod types;

pub use aggregate::aggregate;
pub use browser::ChromiumDriver;
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_detail, fetch_page};
pub use frontier::Frontier;
pub use interactive::{wait_for, wait_stale, InteractiveDiscoverer, ListingDriver, POLL_INTERVAL};
pub use parser::{ListingEntries, ListingParser};
pub use pool::{FetchPool, PoolOutcome};
pub use template::{politeness_delay, TemplateDiscoverer};
pub use types::{DetailRecord, Discovery, ListingPageRef, ProfileLink};
