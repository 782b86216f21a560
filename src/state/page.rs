//! Page and link definitions for the site map
//!
//! A `Page` is built once per successfully fetched URL and is not modified
//! after the coordinator stores it.

use url::Url;

/// A directed edge discovered on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    /// The page the link was found on
    pub source: Url,

    /// Where the link points (absolute)
    pub target: Url,
}

impl Link {
    pub fn new(source: Url, target: Url) -> Self {
        Self { source, target }
    }
}

/// One successfully fetched document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Canonical URL of the page
    pub url: Url,

    /// Outbound links in the order they appear in the document
    pub links: Vec<Link>,

    /// Asset URLs (images, scripts, stylesheets, icons)
    pub assets: Vec<Url>,
}

impl Page {
    /// Builds a page from raw fetch output, turning each target into a link
    /// sourced at `url`
    pub fn from_fetch(url: Url, link_targets: Vec<Url>, assets: Vec<Url>) -> Self {
        let links = link_targets
            .into_iter()
            .map(|target| Link::new(url.clone(), target))
            .collect();

        Self { url, links, assets }
    }

    /// Iterates over the link targets in document order
    pub fn link_targets(&self) -> impl Iterator<Item = &Url> {
        self.links.iter().map(|link| &link.target)
    }
}
