//! Roster-Sweep: a directory crawler for contact rosters
//!
//! This crate walks paginated staff/agent directories on third-party sites,
//! fetches each profile page and extracts contact records through per-site,
//! declarative fallback chains of selectors and patterns.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Roster-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Listing marker '{marker}' did not appear within {timeout:?}")]
    ListingTimeout { marker: String, timeout: Duration },

    #[error("Invalid pagination transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PaginationState,
        to: state::PaginationState,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

impl From<chromiumoxide::error::CdpError> for SweepError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SweepError::Browser(err.to_string())
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Unusable link: {0}")]
    Unusable(String),
}

/// Result type alias for Roster-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, SiteConfig};
pub use crawler::{run_crawl, DetailRecord, ProfileLink};
pub use output::{CrawlSummary, CsvSink, RecordSink};
pub use state::PaginationState;
