//! Output module for crawl results
//!
//! This module handles:
//! - Handing a site's ordered records to a record sink (CSV by default)
//! - Reporting progress as structured events
//! - Summarizing finished crawls

mod csv_output;
pub mod events;
pub mod stats;
mod traits;

pub use csv_output::{write_csv, CsvSink, CSV_HEADER};
pub use events::{CrawlEvent, EventSink, MemoryEventSink, TracingEventSink};
pub use stats::{print_statistics, render_statistics, CrawlStatistics};
pub use traits::{CrawlSummary, OutputError, OutputResult, RecordSink};
