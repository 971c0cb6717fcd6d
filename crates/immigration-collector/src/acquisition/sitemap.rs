//! Sitemap reader.
//!
//! Returns `urlset/url/loc` entries and, for sitemap indexes,
//! `sitemapindex/sitemap/loc` entries. Child sitemaps are not fetched here;
//! they come back as ordinary URLs for the frontier to pick up.

use crate::acquisition::http_client::{Transport, ACCEPT_SITEMAP};
use crate::acquisition::xml_source::{self, PathRule, XmlFormat};
use tracing::warn;

const SITEMAP_RULES: &[PathRule] = &[
    PathRule::text(&["urlset", "url", "loc"]),
    PathRule::text(&["sitemapindex", "sitemap", "loc"]),
];

const SITEMAP_SOURCE: XmlFormat = XmlFormat {
    accept: ACCEPT_SITEMAP,
    prologues: &["<?xml", "<urlset", "<sitemapindex"],
    rules: SITEMAP_RULES,
};

/// Fetch a sitemap or sitemap index and return its locations.
///
/// Failures are logged and yield an empty list.
pub async fn discover_from_sitemap(transport: &dyn Transport, sitemap_url: &str) -> Vec<String> {
    match xml_source::read_xml_source(transport, sitemap_url, &SITEMAP_SOURCE).await {
        Ok(locs) => locs,
        Err(e) => {
            warn!(sitemap = %sitemap_url, error = %e, "sitemap discovery failed");
            Vec::new()
        }
    }
}

/// Parse sitemap XML into locations.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    xml_source::extract_paths(xml, SITEMAP_RULES)
}
