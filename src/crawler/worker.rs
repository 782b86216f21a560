//! Crawl worker: one task per page attempt
//!
//! A worker fetches exactly one page, applies the depth cutoff, and hands a
//! single `CrawlResult` back to the coordinator.

use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::state::Page;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use url::Url;

/// What happened to one page attempt
#[derive(Debug)]
pub enum Outcome {
    /// The page was fetched and parsed
    Completed(Page),

    /// The depth budget was exhausted; nothing was fetched
    Skipped,

    /// The fetch failed
    Errored(FetchError),
}

/// The envelope a worker sends back to the coordinator
#[derive(Debug)]
pub struct CrawlResult {
    /// The URL attempted
    pub url: Url,

    /// Depth budget remaining at the time of the attempt
    pub depth: u32,

    pub outcome: Outcome,
}

/// Attempts one page
///
/// A depth of zero means the page lies one hop past the allowed horizon, so
/// it is skipped without touching the fetcher or the concurrency permits.
pub async fn attempt<F>(
    url: Url,
    depth: u32,
    fetcher: &F,
    permits: Option<&Semaphore>,
) -> CrawlResult
where
    F: Fetcher + ?Sized,
{
    if depth == 0 {
        tracing::debug!("Skipping {} as at 0 depth", url);
        return CrawlResult {
            url,
            depth,
            outcome: Outcome::Skipped,
        };
    }

    // A closed semaphore only means the cap is gone; fetch anyway
    let _permit = match permits {
        Some(semaphore) => semaphore.acquire().await.ok(),
        None => None,
    };

    let outcome = match fetcher.fetch(&url).await {
        Ok(fetched) => {
            tracing::info!("{} URLs found at {}", fetched.links.len(), url);
            Outcome::Completed(Page::from_fetch(url.clone(), fetched.links, fetched.assets))
        }
        Err(e) => Outcome::Errored(e),
    };

    CrawlResult {
        url,
        depth,
        outcome,
    }
}

/// Spawns a worker task that reports into `results`
///
/// A panic inside the fetcher is reported as an `Errored` outcome so the
/// coordinator still receives exactly one result for this spawn. If the
/// coordinator has gone away the result is dropped.
pub fn spawn<F>(
    url: Url,
    depth: u32,
    fetcher: Arc<F>,
    permits: Option<Arc<Semaphore>>,
    results: mpsc::UnboundedSender<CrawlResult>,
) where
    F: Fetcher + ?Sized + 'static,
{
    tokio::spawn(async move {
        let attempt_url = url.clone();
        let run = attempt(attempt_url, depth, fetcher.as_ref(), permits.as_deref());

        let result = match AssertUnwindSafe(run).catch_unwind().await {
            Ok(result) => result,
            Err(_) => CrawlResult {
                outcome: Outcome::Errored(FetchError::WorkerPanicked {
                    url: url.to_string(),
                }),
                url,
                depth,
            },
        };

        if results.send(result).is_err() {
            tracing::debug!("Coordinator gone, dropping result");
        }
    });
}
