//! Roster-Sweep main entry point
//!
//! This is the command-line interface for the Roster-Sweep directory crawler.

use anyhow::{bail, Context};
use clap::Parser;
use roster_sweep::config::{load_config_with_hash, Config, DiscoveryConfig, SiteConfig};
use roster_sweep::output::{print_statistics, CsvSink, TracingEventSink};
use roster_sweep::{run_crawl, CrawlSummary};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Roster-Sweep: a directory crawler for contact rosters
///
/// Roster-Sweep walks paginated staff directories, fetches every profile
/// page and writes one CSV of contact records per site.
#[derive(Parser, Debug)]
#[command(name = "roster-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A directory crawler for contact rosters", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Only crawl the named site (repeatable); all sites when omitted
    #[arg(short, long = "site", value_name = "NAME")]
    sites: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "list_sites")]
    dry_run: bool,

    /// List configured sites and exit
    #[arg(long, conflicts_with = "dry_run")]
    list_sites: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let sites = select_sites(&config, &cli.sites)?;

    if cli.list_sites {
        for site in &config.sites {
            println!("{}", site.name);
        }
        return Ok(());
    }

    if cli.dry_run {
        print_dry_run(&config, &sites);
        return Ok(());
    }

    handle_crawl(&config, &sites).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("roster_sweep=info,warn"),
            1 => EnvFilter::new("roster_sweep=debug,info"),
            2 => EnvFilter::new("roster_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves `--site` names against the configuration
fn select_sites<'a>(config: &'a Config, names: &[String]) -> anyhow::Result<Vec<&'a SiteConfig>> {
    if names.is_empty() {
        return Ok(config.sites.iter().collect());
    }

    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match config.site(name) {
            Some(site) => selected.push(site),
            None => bail!("Unknown site '{}'", name),
        }
    }
    Ok(selected)
}

/// Handles the --dry-run mode: shows what would be crawled
fn print_dry_run(config: &Config, sites: &[&SiteConfig]) {
    println!("=== Roster-Sweep Dry Run ===\n");

    println!("HTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!(
        "  Timeouts: listing {}s, detail {}s, connect {}s",
        config.http.listing_timeout_secs,
        config.http.detail_timeout_secs,
        config.http.connect_timeout_secs
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  BOM: {}", config.output.bom);

    println!("\nSites ({}):", sites.len());
    for site in sites {
        let [min_delay, max_delay] = site.politeness_delay_ms;
        match &site.discovery {
            DiscoveryConfig::Template(t) => {
                println!(
                    "  - {} (template, {:?} mode, pages {}..={})",
                    site.name, t.mode, t.start_page, t.max_pages
                );
                println!("    * {}", t.url_template);
            }
            DiscoveryConfig::Interactive(i) => {
                println!(
                    "  - {} (interactive, up to {} pages, headless: {})",
                    site.name, i.max_pages, i.headless
                );
                println!("    * {}", i.entry_url);
            }
        }
        println!(
            "    * {} workers, {}-{}ms between listing pages",
            site.workers, min_delay, max_delay
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation: each selected site in turn
async fn handle_crawl(config: &Config, sites: &[&SiteConfig]) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with what has been collected");
            signal_cancel.cancel();
        }
    });

    let sink = CsvSink::new(&config.output.directory, config.output.bom);
    tracing::info!("Writing output to {}", sink.directory().display());
    let events = TracingEventSink;
    let mut summaries: Vec<CrawlSummary> = Vec::with_capacity(sites.len());
    let mut failed_sites = Vec::new();

    for site in sites {
        if cancel.is_cancelled() {
            tracing::warn!("Skipping site {} after interrupt", site.name);
            continue;
        }

        match run_crawl(site, &config.http, &sink, &events, &cancel).await {
            Ok(summary) => {
                println!("[{}] {}", site.name, summary.message());
                summaries.push(summary);
            }
            Err(e) => {
                tracing::error!("Crawl of {} failed: {}", site.name, e);
                failed_sites.push(site.name.clone());
            }
        }
    }

    if summaries.len() > 1 {
        println!();
        print_statistics(&summaries);
    }

    let partial: Vec<&str> = summaries
        .iter()
        .filter(|s| s.is_partial())
        .map(|s| s.site.as_str())
        .collect();

    if !failed_sites.is_empty() {
        bail!("Crawl failed for: {}", failed_sites.join(", "));
    }
    if !partial.is_empty() {
        bail!("Incomplete output for: {}", partial.join(", "));
    }

    Ok(())
}
