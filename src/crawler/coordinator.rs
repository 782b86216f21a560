//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the event loop that drives one crawl run:
//! - Spawning a worker per page attempt
//! - Consuming worker outcomes one at a time
//! - Applying the host, dedup and depth policy to discovered links
//! - Detecting completion when nothing is left in flight
//!
//! The coordinator is the only writer of the visited map and counters. All
//! mutation happens inside a single loop iteration, so none of it is locked.

use crate::config::DedupPolicy;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::worker::{self, CrawlResult, Outcome};
use crate::state::{CrawlState, CrawlStats, Page};
use crate::url::{normalize_url, same_host};
use crate::{SumiError, UrlError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use url::Url;

/// Everything a finished crawl run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The crawl target as fetched
    pub target: Url,

    /// Fetched pages keyed by normalized URL; each `Page::url` is the URL
    /// that was actually requested
    pub pages: HashMap<String, Page>,

    /// Fetch attempts made (spawned workers minus depth skips)
    pub total_requests: usize,

    /// Per-outcome counters and the list of failed fetches
    pub stats: CrawlStats,
}

impl CrawlReport {
    /// Pages sorted by URL, for deterministic output
    pub fn sorted_pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.pages.values().collect();
        pages.sort_by(|a, b| a.url.as_str().cmp(b.url.as_str()));
        pages
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<F: Fetcher + ?Sized> {
    fetcher: Arc<F>,
    dedup: DedupPolicy,
    permits: Option<Arc<Semaphore>>,
    state: CrawlState,
}

impl<F: Fetcher + ?Sized + 'static> Coordinator<F> {
    /// Creates a coordinator with unbounded fan-out and the default dedup policy
    pub fn new(fetcher: Arc<F>) -> Self {
        Self {
            fetcher,
            dedup: DedupPolicy::default(),
            permits: None,
            state: CrawlState::new(),
        }
    }

    /// Sets how already-seen URLs are recognised
    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Caps the number of fetches running at the same time
    ///
    /// The limit is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        let limit = limit.clamp(1, Semaphore::MAX_PERMITS);
        self.permits = Some(Arc::new(Semaphore::new(limit)));
        self
    }

    /// Crawls `target` to `max_depth` hops and returns the site map
    ///
    /// A depth of zero skips the target itself and yields an empty map.
    /// Fetch failures never abort the run; the only error is a target that
    /// does not parse as an HTTP(S) URL (or broken internal bookkeeping).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use sumi_map::config::Config;
    /// use sumi_map::crawler::{Coordinator, HttpFetcher};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Config::default();
    /// let fetcher = HttpFetcher::from_config(&config.user_agent, &config.fetcher)?;
    /// let mut coordinator = Coordinator::new(Arc::new(fetcher));
    /// let report = coordinator.run("https://example.com/", 2).await?;
    /// println!("{} pages", report.pages.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&mut self, target: &str, max_depth: u32) -> Result<CrawlReport, SumiError> {
        let invalid_target = |source: UrlError| SumiError::InvalidTarget {
            target: target.to_string(),
            source,
        };

        let root_key = normalize_url(target).map_err(invalid_target)?;
        let mut root = Url::parse(target)
            .map_err(|e| invalid_target(UrlError::Parse(e.to_string())))?;
        root.set_fragment(None);

        self.state.reset();

        // The channel lives for this run only, so nothing from an earlier run can leak in
        let (results_tx, mut results_rx) = mpsc::unbounded_channel::<CrawlResult>();

        tracing::info!(
            "Starting crawl of {} (max depth {}, dedup {:?})",
            root,
            max_depth,
            self.dedup
        );

        self.spawn(root.clone(), root_key.to_string(), max_depth, &results_tx);

        // Event loop
        while let Some(result) = results_rx.recv().await {
            self.handle_result(&root, result, &results_tx);

            // Decrement outstanding requests and stop once nothing is left
            if self.state.finish_outcome()? == 0 {
                tracing::debug!("Complete");
                break;
            }
        }

        let (pages, total_requests, stats) = self.state.take();

        tracing::info!(
            "Crawl of {} finished: {} pages, {} requests, {} errors, {} skipped",
            root,
            pages.len(),
            total_requests,
            stats.errored,
            stats.skipped
        );

        Ok(CrawlReport {
            target: root,
            pages,
            total_requests,
            stats,
        })
    }

    /// Applies one worker outcome to the crawl state
    fn handle_result(
        &mut self,
        target: &Url,
        result: CrawlResult,
        results_tx: &mpsc::UnboundedSender<CrawlResult>,
    ) {
        let CrawlResult {
            url,
            depth,
            outcome,
        } = result;

        match outcome {
            Outcome::Skipped => {
                tracing::debug!("Page skipped for {}", url);
                if let Err(e) = self.state.record_skip() {
                    tracing::error!("{}", e);
                }
            }

            Outcome::Errored(e) => {
                tracing::warn!("Page errored for {}: {}", url, e);
                self.state.record_error(url.as_str(), depth, e.to_string());
            }

            Outcome::Completed(page) => {
                tracing::debug!("Page complete for {}", url);

                let before = self.state.stats().workers_spawned;
                for link in &page.links {
                    self.fan_out(target, &url, &link.target, depth, results_tx);
                }
                tracing::debug!(
                    "Fired {} new requests from {}, {} currently in flight",
                    self.state.stats().workers_spawned - before,
                    url,
                    self.state.in_flight()
                );

                if !self.state.store_page(page_key(&url), page) {
                    tracing::debug!("Duplicate fetch of {}, keeping first page", url);
                }
            }
        }
    }

    /// Decides whether one discovered link becomes a new worker
    fn fan_out(
        &mut self,
        target: &Url,
        source: &Url,
        link: &Url,
        depth: u32,
        results_tx: &mpsc::UnboundedSender<CrawlResult>,
    ) {
        // Off-site links stay in the page but are never crawled
        if !same_host(target, link) {
            tracing::trace!("Skipping {} as not on target host", link);
            self.state.record_off_site_link();
            return;
        }

        // The normalized form only keys the visited map; the worker fetches
        // the link as written
        let key = match normalize_url(link.as_str()) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!("Failed to normalize URL {}: {}", link, e);
                return;
            }
        };

        if self.state.is_known(&key, self.dedup) {
            tracing::trace!("Skipping {} as already processed", link);
            self.state.record_suppressed_link();
            return;
        }

        let mut link = link.clone();
        link.set_fragment(None);

        tracing::debug!("Triggering crawl of {} from {}", link, source);
        self.spawn(link, key, depth.saturating_sub(1), results_tx);
    }

    /// Registers `key` and spawns one worker fetching `url`
    fn spawn(
        &mut self,
        url: Url,
        key: String,
        depth: u32,
        results_tx: &mpsc::UnboundedSender<CrawlResult>,
    ) {
        self.state.register_spawn(key);
        worker::spawn(
            url,
            depth,
            Arc::clone(&self.fetcher),
            self.permits.clone(),
            results_tx.clone(),
        );
    }
}

/// Visited-map key for a fetched URL
fn page_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|key| key.to_string())
        .unwrap_or_else(|_| url.to_string())
}
