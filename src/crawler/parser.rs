//! HTML parser for extracting links, assets and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to other documents (from <a> tags)
//! - Assets the page loads (images, scripts, stylesheets, icons)
//! - Page title

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// All links found on the page (absolute URLs, document order)
    pub links: Vec<Url>,

    /// All assets referenced by the page (absolute URLs, grouped by kind)
    pub assets: Vec<Url>,
}

/// Parses HTML content and extracts links, assets and the title
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to HTTP(S)
///
/// Fragments are stripped from resolved links.
///
/// # Asset Extraction Rules
///
/// - `<img src="...">`
/// - `<script src="...">`
/// - `<link href="...">` whose `rel` mentions `stylesheet` or `icon`
///
/// # Example
///
/// ```
/// use sumi_map::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
        assets: extract_assets(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Extracts images, scripts, stylesheets and icons from the HTML document
fn extract_assets(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut assets = Vec::new();

    // First grab all the images, then scripts
    for (selector, attr) in [("img[src]", "src"), ("script[src]", "src")] {
        if let Ok(selector) = Selector::parse(selector) {
            for element in document.select(&selector) {
                if let Some(asset) = element
                    .value()
                    .attr(attr)
                    .and_then(|src| resolve_link(src, base_url))
                {
                    assets.push(asset);
                }
            }
        }
    }

    // Link elements: styles, shortcut icons etc
    if let Ok(link_selector) = Selector::parse("link[href][rel]") {
        for element in document.select(&link_selector) {
            let rel = element
                .value()
                .attr("rel")
                .unwrap_or_default()
                .to_ascii_lowercase();

            let is_asset = rel
                .split_ascii_whitespace()
                .any(|token| token == "stylesheet" || token == "icon");
            if !is_asset {
                continue;
            }

            if let Some(asset) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                assets.push(asset);
            }
        }
    }

    assets
}

/// Resolves an href to an absolute URL and validates it
///
/// Returns None if the reference should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Same page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(mut absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                absolute_url.set_fragment(None);
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(e) => {
            tracing::debug!("Failed to resolve {} against {}: {}", href, base_url, e);
            None
        }
    }
}
