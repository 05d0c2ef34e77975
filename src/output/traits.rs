//! Output sink traits and types
//!
//! This module defines the interface the crawl core hands its results to,
//! and the summary a finished crawl reports back to its caller.

use crate::crawler::DetailRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination of a finished site's ordered records
///
/// The core performs no persistence of its own; naming and placement of
/// whatever the sink produces are the sink's responsibility.
pub trait RecordSink: Send + Sync {
    /// Persists one run's records and returns where they went
    ///
    /// # Arguments
    ///
    /// * `site` - The site name the records belong to
    /// * `records` - Records in their final, deterministic order
    fn write_records(&self, site: &str, records: &[DetailRecord]) -> OutputResult<PathBuf>;
}

/// Summary of one site's crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    /// Site name
    pub site: String,

    /// Number of records handed to the sink
    pub count: usize,

    /// Wall-clock duration of the run
    pub elapsed_seconds: f64,

    /// Listing pages that were read successfully
    pub pages_visited: u32,

    /// Distinct profile links discovered
    pub links_discovered: usize,

    /// Profile fetches that failed and contributed no record
    pub fetch_failures: usize,

    /// Why discovery stopped early, if it did
    pub discovery_error: Option<String>,

    /// Whether the run was cancelled by its caller
    pub cancelled: bool,

    /// Where the sink put the records
    pub output: Option<PathBuf>,
}

impl CrawlSummary {
    /// Creates a new empty summary for a site
    pub fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            ..Self::default()
        }
    }

    /// Returns true when the output holds only part of the directory
    pub fn is_partial(&self) -> bool {
        self.discovery_error.is_some() || self.cancelled
    }

    /// Returns the share of discovered profiles that produced a record
    pub fn success_rate(&self) -> f64 {
        let attempted = self.count + self.fetch_failures;
        if attempted == 0 {
            return 0.0;
        }
        (self.count as f64 / attempted as f64) * 100.0
    }

    /// One-line result message for the orchestration layer
    pub fn message(&self) -> String {
        let file = self
            .output
            .as_ref()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "-".to_string());
        format!("TOTAL: {} rows, file: {}", self.count, file)
    }
}
