//! Output module for site maps and crawl summaries
//!
//! This module handles:
//! - Generating XML sitemaps
//! - Generating JSON site-structure documents
//! - Printing crawl statistics

mod sitemap;
pub mod stats;
mod structure;

pub use sitemap::build_xml_sitemap;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use structure::build_json_structure;

use crate::config::OutputConfig;
use crate::crawler::CrawlReport;
use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to format JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes every output file configured in `config`
///
/// Returns the paths that were written. Nothing is written for outputs
/// without a configured path.
pub fn write_outputs(report: &CrawlReport, config: &OutputConfig) -> OutputResult<Vec<PathBuf>> {
    write_outputs_at(report, config, Utc::now().date_naive())
}

/// Same as `write_outputs` with an explicit sitemap `lastmod` date
pub fn write_outputs_at(
    report: &CrawlReport,
    config: &OutputConfig,
    lastmod: NaiveDate,
) -> OutputResult<Vec<PathBuf>> {
    let pages = report.sorted_pages();
    let mut written = Vec::new();

    if let Some(path) = &config.sitemap_path {
        let xml = build_xml_sitemap(&pages, lastmod);
        written.push(write_file(Path::new(path), &xml)?);
    }

    if let Some(path) = &config.structure_path {
        let json = build_json_structure(&report.target, &pages)?;
        written.push(write_file(Path::new(path), &json)?);
    }

    Ok(written)
}

fn write_file(path: &Path, content: &str) -> OutputResult<PathBuf> {
    std::fs::write(path, content).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}
