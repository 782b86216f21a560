//! Crawler module for site mapping
//!
//! This module contains the core crawling logic, including:
//! - The `Fetcher` seam and its HTTP implementation
//! - HTML parsing and link/asset extraction
//! - Worker tasks that attempt one page each
//! - The coordinator event loop that ties them together

mod coordinator;
mod fetcher;
mod parser;
mod worker;

pub use coordinator::{Coordinator, CrawlReport};
pub use fetcher::{build_http_client, format_user_agent, FetchError, Fetched, Fetcher, HttpFetcher};
pub use parser::{parse_html, ParsedPage};
pub use worker::{attempt, CrawlResult, Outcome};

use crate::config::Config;
use crate::SumiError;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client from the configuration
/// 2. Validate the target URL
/// 3. Fetch pages concurrently up to the configured depth
/// 4. Return the site map with request counts and statistics
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `target` - The page to start from; only its host is crawled
///
/// # Example
///
/// ```no_run
/// use sumi_map::config::Config;
/// use sumi_map::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = crawl(&Config::default(), "https://example.com/").await?;
/// println!("{} requests", report.total_requests);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config, target: &str) -> Result<CrawlReport, SumiError> {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.fetcher)?;

    let mut coordinator = Coordinator::new(Arc::new(fetcher)).with_dedup(config.crawler.dedup);
    if let Some(limit) = config.crawler.max_concurrency {
        coordinator = coordinator.with_max_concurrency(limit as usize);
    }

    coordinator.run(target, config.crawler.max_depth).await
}
