//! State module for the site map and crawl bookkeeping
//!
//! # Components
//!
//! - `Page` / `Link`: the site map built from successful fetches
//! - `CrawlState`: the visited map, claimed set and counters owned by the coordinator
//! - `CrawlStats`: per-run counters handed back with the crawl report

mod crawl_state;
mod page;

// Re-export main types
pub use crawl_state::{CrawlState, CrawlStats, FetchFailure};
pub use page::{Link, Page};
