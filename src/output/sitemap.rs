//! XML sitemap generation
//!
//! Produces a sitemaps.org 0.9 `urlset` document with one entry per page.

use crate::state::Page;
use chrono::NaiveDate;
use quick_xml::escape::escape;

const SITEMAP_HEADER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
   xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
   xsi:schemaLocation="http://www.sitemaps.org/schemas/sitemap/0.9 http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd">
"#;

const SITEMAP_FOOTER: &str = "</urlset>\n";

/// Builds a standard XML sitemap from a list of pages
///
/// Every page gets the same `lastmod` date, a daily change frequency and a
/// priority of 0.8.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use sumi_map::output::build_xml_sitemap;
///
/// let xml = build_xml_sitemap(&[], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// assert!(xml.contains("<urlset"));
/// ```
pub fn build_xml_sitemap(pages: &[&Page], lastmod: NaiveDate) -> String {
    let mut xml = String::from(SITEMAP_HEADER);
    let lastmod = lastmod.format("%Y-%m-%d").to_string();

    for page in pages {
        xml.push_str("\t<url>\n");
        xml.push_str(&format!("\t\t<loc>{}</loc>\n", escape(page.url.as_str())));
        xml.push_str(&format!("\t\t<lastmod>{}</lastmod>\n", lastmod));
        xml.push_str("\t\t<changefreq>daily</changefreq>\n");
        xml.push_str("\t\t<priority>0.8</priority>\n");
        xml.push_str("\t</url>\n");
    }

    xml.push_str(SITEMAP_FOOTER);
    xml
}
