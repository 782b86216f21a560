//! Coordinator-owned crawl bookkeeping
//!
//! Everything in here is mutated only from the coordinator's event loop, one
//! worker outcome at a time, so it carries no locks.

use crate::config::DedupPolicy;
use crate::state::Page;
use crate::SumiError;
use std::collections::{HashMap, HashSet};

/// A fetch that failed during the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// The URL that was attempted
    pub url: String,

    /// Depth budget remaining when it was attempted
    pub depth: u32,

    /// Human-readable cause
    pub cause: String,
}

/// Counters describing what happened during one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Workers spawned, including the root
    pub workers_spawned: usize,

    /// Outcomes that carried a fetched page
    pub pages_completed: usize,

    /// Outcomes skipped because the depth budget was exhausted
    pub skipped: usize,

    /// Outcomes that carried a fetch error
    pub errored: usize,

    /// Completed pages whose URL was already stored (the first one is kept)
    pub duplicate_pages: usize,

    /// Links not followed because they leave the target host
    pub off_site_links: usize,

    /// Same-host links not followed because the URL was already handled
    pub suppressed_links: usize,

    /// Every failed fetch, in the order the coordinator received them
    pub failures: Vec<FetchFailure>,
}

/// Visited map, claimed set and counters for one crawl run
#[derive(Debug, Default)]
pub struct CrawlState {
    pages: HashMap<String, Page>,
    claimed: HashSet<String>,
    in_flight: usize,
    total_requests: usize,
    stats: CrawlStats,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all state for a new run
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns true if `key` must not be fetched again under `policy`
    pub fn is_known(&self, key: &str, policy: DedupPolicy) -> bool {
        match policy {
            DedupPolicy::Completed => self.pages.contains_key(key),
            DedupPolicy::InFlight => self.pages.contains_key(key) || self.claimed.contains(key),
        }
    }

    /// Records that a worker is about to be spawned for `key`
    pub fn register_spawn(&mut self, key: String) {
        self.claimed.insert(key);
        self.in_flight += 1;
        self.total_requests += 1;
        self.stats.workers_spawned += 1;
    }

    /// Records a depth-exhausted outcome, undoing its request count
    pub fn record_skip(&mut self) -> Result<(), SumiError> {
        self.total_requests = self.total_requests.checked_sub(1).ok_or_else(|| {
            SumiError::Bookkeeping("skip received with no outstanding requests".to_string())
        })?;
        self.stats.skipped += 1;
        Ok(())
    }

    /// Records a failed fetch
    pub fn record_error(&mut self, url: &str, depth: u32, cause: String) {
        self.stats.errored += 1;
        self.stats.failures.push(FetchFailure {
            url: url.to_string(),
            depth,
            cause,
        });
    }

    pub fn record_off_site_link(&mut self) {
        self.stats.off_site_links += 1;
    }

    pub fn record_suppressed_link(&mut self) {
        self.stats.suppressed_links += 1;
    }

    /// Stores a completed page; returns false if one was already stored
    pub fn store_page(&mut self, key: String, page: Page) -> bool {
        self.stats.pages_completed += 1;

        if self.pages.contains_key(&key) {
            self.stats.duplicate_pages += 1;
            return false;
        }

        self.pages.insert(key, page);
        true
    }

    /// Marks one outcome as consumed and returns how many remain in flight
    pub fn finish_outcome(&mut self) -> Result<usize, SumiError> {
        self.in_flight = self.in_flight.checked_sub(1).ok_or_else(|| {
            SumiError::Bookkeeping("outcome received with nothing in flight".to_string())
        })?;
        Ok(self.in_flight)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn total_requests(&self) -> usize {
        self.total_requests
    }

    pub fn pages(&self) -> &HashMap<String, Page> {
        &self.pages
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Hands the accumulated results to the caller, leaving the state empty
    pub fn take(&mut self) -> (HashMap<String, Page>, usize, CrawlStats) {
        let state = std::mem::take(self);
        (state.pages, state.total_requests, state.stats)
    }
}
