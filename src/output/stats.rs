//! Crawl statistics display
//!
//! This module turns a finished crawl report into a short human-readable
//! summary.

use crate::crawler::CrawlReport;
use std::collections::HashSet;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// Pages successfully fetched
    pub total_pages: usize,

    /// Fetch attempts made
    pub total_requests: usize,

    /// Links found across all pages
    pub total_links: usize,

    /// Distinct link targets across all pages
    pub unique_link_targets: usize,

    /// Assets found across all pages
    pub total_assets: usize,

    /// Links left unfollowed because they leave the target host
    pub off_site_links: usize,

    /// Depth-exhausted attempts
    pub skipped: usize,

    /// Failed fetches as (url, cause)
    pub errors: Vec<(String, String)>,
}

/// Computes statistics from a crawl report
pub fn load_statistics(report: &CrawlReport) -> CrawlStatistics {
    let total_links = report.pages.values().map(|p| p.links.len()).sum();
    let total_assets = report.pages.values().map(|p| p.assets.len()).sum();
    let unique_link_targets = report
        .pages
        .values()
        .flat_map(|p| p.link_targets())
        .map(|u| u.as_str())
        .collect::<HashSet<_>>()
        .len();

    CrawlStatistics {
        total_pages: report.pages.len(),
        total_requests: report.total_requests,
        total_links,
        unique_link_targets,
        total_assets,
        off_site_links: report.stats.off_site_links,
        skipped: report.stats.skipped,
        errors: report
            .stats
            .failures
            .iter()
            .map(|f| (f.url.clone(), f.cause.clone()))
            .collect(),
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages mapped: {}", stats.total_pages);
    println!("  Requests made: {}", stats.total_requests);
    println!(
        "  Links found: {} ({} unique targets, {} off-site)",
        stats.total_links, stats.unique_link_targets, stats.off_site_links
    );
    println!("  Assets found: {}", stats.total_assets);
    println!("  Skipped at depth limit: {}", stats.skipped);
    println!();

    if !stats.errors.is_empty() {
        println!("Errors ({}):", stats.errors.len());
        for (url, cause) in &stats.errors {
            println!("  - {}: {}", url, cause);
        }
        println!();
    }

    println!("Success Rate: {:.1}%", stats.success_rate());
}

impl CrawlStatistics {
    /// Share of fetch attempts that produced a page
    pub fn success_rate(&self) -> f64 {
        if self.total_requests > 0 {
            (self.total_pages as f64 / self.total_requests as f64) * 100.0
        } else {
            0.0
        }
    }
}
