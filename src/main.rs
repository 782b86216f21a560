//! Sumi-Map main entry point
//!
//! This is the command-line interface for the Sumi-Map site mapper.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_map::config::{load_config, validate, Config, DedupPolicy};
use sumi_map::crawler::crawl;
use sumi_map::output::{load_statistics, print_statistics, write_outputs};
use sumi_map::url::normalize_url;
use tracing_subscriber::EnvFilter;

/// Sumi-Map: a single-site structure mapper
///
/// Sumi-Map crawls one site from a target page, following same-host links
/// to a bounded depth, and writes an XML sitemap and a JSON map of every
/// page's links and assets.
#[derive(Parser, Debug)]
#[command(name = "sumi-map")]
#[command(version)]
#[command(about = "A single-site structure mapper", long_about = None)]
struct Cli {
    /// Page to start crawling from; only its host is followed
    #[arg(value_name = "TARGET")]
    target: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of hops from the target to fetch
    #[arg(short, long)]
    depth: Option<u32>,

    /// Maximum simultaneous fetches
    #[arg(long)]
    max_concurrency: Option<u32>,

    /// How already-seen URLs are recognised
    #[arg(long, value_enum)]
    dedup: Option<DedupPolicy>,

    /// Write an XML sitemap to this path
    #[arg(long, value_name = "PATH")]
    sitemap: Option<String>,

    /// Write the JSON site structure to this path
    #[arg(long, value_name = "PATH")]
    structure: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and target and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, &cli.target)
    } else {
        handle_crawl(&config, &cli.target, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_map=info,warn"),
            1 => EnvFilter::new("sumi_map=debug,info"),
            2 => EnvFilter::new("sumi_map=trace,debug"),
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

/// Loads the configuration file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(limit) = cli.max_concurrency {
        config.crawler.max_concurrency = Some(limit);
    }
    if let Some(dedup) = cli.dedup {
        config.crawler.dedup = dedup;
    }
    if let Some(path) = &cli.sitemap {
        config.output.sitemap_path = Some(path.clone());
    }
    if let Some(path) = &cli.structure {
        config.output.structure_path = Some(path.clone());
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates config and target and shows what would be crawled
fn handle_dry_run(config: &Config, target: &str) -> anyhow::Result<()> {
    let target = normalize_url(target).with_context(|| format!("Invalid target '{}'", target))?;

    println!("=== Sumi-Map Dry Run ===\n");

    println!("Target: {}", target);
    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    match config.crawler.max_concurrency {
        Some(limit) => println!("  Max concurrency: {}", limit),
        None => println!("  Max concurrency: unbounded"),
    }
    println!("  Dedup policy: {:?}", config.crawler.dedup);

    println!("\nFetcher:");
    println!("  User agent: {}", sumi_map::crawler::format_user_agent(&config.user_agent));
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Connect timeout: {}s", config.fetcher.connect_timeout_secs);
    println!("  Max redirects: {}", config.fetcher.max_redirects);

    println!("\nOutput:");
    println!(
        "  Sitemap: {}",
        config.output.sitemap_path.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Structure: {}",
        config.output.structure_path.as_deref().unwrap_or("(none)")
    );

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, target: &str, quiet: bool) -> anyhow::Result<()> {
    let report = crawl(config, target)
        .await
        .with_context(|| format!("Crawl of {} failed", target))?;

    if !quiet {
        print_statistics(&load_statistics(&report));
    }

    let written = write_outputs(&report, &config.output).context("Failed to write output")?;
    if written.is_empty() {
        tracing::info!("No output paths configured; pass --sitemap or --structure to save the map");
    }

    Ok(())
}
