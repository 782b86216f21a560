//! Page fetching
//!
//! This module defines the `Fetcher` seam the coordinator is generic over and
//! the production HTTP implementation, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with status and Content-Type checks
//! - Link and asset extraction via the HTML parser

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::crawler::parser::parse_html;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors a single page fetch can end with
///
/// The coordinator treats every variant the same way: the page is recorded
/// as failed and produces no children.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type}")]
    NotHtml { url: String, content_type: String },

    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Worker for {url} panicked")]
    WorkerPanicked { url: String },
}

/// Links and assets found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fetched {
    /// Outbound hyperlinks, absolute, in document order
    pub links: Vec<Url>,

    /// Asset URLs, absolute
    pub assets: Vec<Url>,
}

/// Retrieves a page and reports what it links to
///
/// Implementations resolve relative references themselves; the coordinator
/// only ever sees absolute URLs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `config` - Timeouts and redirect limits
///
/// # Example
///
/// ```no_run
/// use sumi_map::config::{FetcherConfig, UserAgentConfig};
/// use sumi_map::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    config: &FetcherConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(format_user_agent(user_agent))
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Format: CrawlerName/Version (+ContactURL)
pub fn format_user_agent(config: &UserAgentConfig) -> String {
    match &config.contact_url {
        Some(contact) => format!(
            "{}/{} (+{})",
            config.crawler_name, config.crawler_version, contact
        ),
        None => format!("{}/{}", config.crawler_name, config.crawler_version),
    }
}

/// Fetcher backed by reqwest and the HTML parser
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with a client configured from `user_agent` and `config`
    pub fn from_config(
        user_agent: &UserAgentConfig,
        config: &FetcherConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, config)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// # Request Flow
    ///
    /// 1. GET the URL, following redirects up to the configured limit
    /// 2. Non-2xx status → `FetchError::Status`
    /// 3. Content-Type present and not HTML → `FetchError::NotHtml`
    /// 4. Parse the body, resolving references against the final URL
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(content_type) = content_type {
            if !is_html(&content_type) {
                return Err(FetchError::NotHtml {
                    url: url.to_string(),
                    content_type,
                });
            }
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(request_error)?;

        let parsed = parse_html(&body, &final_url);
        tracing::debug!(
            "Parsed {} ({}): {} links, {} assets",
            url,
            parsed.title.as_deref().unwrap_or("untitled"),
            parsed.links.len(),
            parsed.assets.len()
        );

        Ok(Fetched {
            links: parsed.links,
            assets: parsed.assets,
        })
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}
