//! JSON site-structure generation

use crate::state::Page;
use serde::Serialize;
use url::Url;

#[derive(Debug, Serialize)]
struct SiteStructure<'a> {
    target: &'a str,
    pages: Vec<FormattedPage<'a>>,
}

#[derive(Debug, Serialize)]
struct FormattedPage<'a> {
    url: &'a str,
    links: Vec<&'a str>,
    assets: Vec<&'a str>,
}

impl<'a> From<&'a Page> for FormattedPage<'a> {
    fn from(page: &'a Page) -> Self {
        Self {
            url: page.url.as_str(),
            links: page.link_targets().map(Url::as_str).collect(),
            assets: page.assets.iter().map(Url::as_str).collect(),
        }
    }
}

/// Builds the JSON site structure for `pages`
///
/// Shape: `{"target": "...", "pages": [{"url": "...", "links": [...], "assets": [...]}]}`.
/// Links are the link targets in document order.
pub fn build_json_structure(target: &Url, pages: &[&Page]) -> Result<String, serde_json::Error> {
    let structure = SiteStructure {
        target: target.as_str(),
        pages: pages.iter().map(|page| FormattedPage::from(*page)).collect(),
    };

    serde_json::to_string_pretty(&structure)
}
