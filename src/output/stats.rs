//! Run statistics across sites
//!
//! This module aggregates per-site crawl summaries into a run report and
//! renders it for the terminal.

use crate::output::traits::CrawlSummary;
use std::fmt::Write;

/// Statistics over every site crawled in one invocation
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Number of sites crawled
    pub sites: usize,

    /// Total records written across sites
    pub total_records: usize,

    /// Total profile links discovered across sites
    pub total_links: usize,

    /// Total failed profile fetches across sites
    pub total_failures: usize,

    /// Sites whose output holds only part of their directory
    pub partial_sites: Vec<String>,

    /// Sum of per-site wall-clock durations
    pub elapsed_seconds: f64,
}

impl CrawlStatistics {
    /// Builds statistics from a run's site summaries
    pub fn from_summaries(summaries: &[CrawlSummary]) -> Self {
        let mut stats = Self {
            sites: summaries.len(),
            ..Self::default()
        };

        for summary in summaries {
            stats.total_records += summary.count;
            stats.total_links += summary.links_discovered;
            stats.total_failures += summary.fetch_failures;
            stats.elapsed_seconds += summary.elapsed_seconds;
            if summary.is_partial() {
                stats.partial_sites.push(summary.site.clone());
            }
        }

        stats
    }
}

/// Renders a run report for the given site summaries
pub fn render_statistics(summaries: &[CrawlSummary]) -> String {
    let stats = CrawlStatistics::from_summaries(summaries);
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Sites:");
    for summary in summaries {
        let _ = writeln!(
            out,
            "  {}: {} records, {} links, {} failed, {} pages, {:.1}s ({:.1}% success)",
            summary.site,
            summary.count,
            summary.links_discovered,
            summary.fetch_failures,
            summary.pages_visited,
            summary.elapsed_seconds,
            summary.success_rate()
        );
        if let Some(reason) = &summary.discovery_error {
            let _ = writeln!(out, "    discovery halted: {}", reason);
        }
        if summary.cancelled {
            let _ = writeln!(out, "    cancelled");
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Totals: {} records from {} links across {} sites ({} failed) in {:.1}s",
        stats.total_records,
        stats.total_links,
        stats.sites,
        stats.total_failures,
        stats.elapsed_seconds
    );

    if !stats.partial_sites.is_empty() {
        let _ = writeln!(out, "Partial sites: {}", stats.partial_sites.join(", "));
    }

    out
}

/// Prints a run report to stdout
pub fn print_statistics(summaries: &[CrawlSummary]) {
    print!("{}", render_statistics(summaries));
}
