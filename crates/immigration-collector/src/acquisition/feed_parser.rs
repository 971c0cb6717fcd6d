//! RSS/Atom feed reader.
//!
//! Reads item links from RSS 2.0 (`rss/channel/item/link`), RSS 1.0
//! (`rdf:RDF/item/link`) and Atom (`feed/entry/link@href`, one or many links
//! per entry).

use crate::acquisition::http_client::{Transport, ACCEPT_FEED};
use crate::acquisition::xml_source::{self, PathRule, XmlFormat};
use tracing::warn;

const FEED_RULES: &[PathRule] = &[
    PathRule::text(&["rss", "channel", "item", "link"]),
    PathRule::text(&["rdf:RDF", "item", "link"]),
    PathRule::attr(&["feed", "entry", "link"], "href"),
];

const FEED_SOURCE: XmlFormat = XmlFormat {
    accept: ACCEPT_FEED,
    prologues: &["<?xml", "<rss", "<feed", "<rdf:RDF"],
    rules: FEED_RULES,
};

/// Fetch a feed and return its item links.
///
/// Never fails: transport errors, bad statuses, non-XML bodies and parse
/// errors are logged and yield an empty list.
pub async fn discover_from_feed(transport: &dyn Transport, feed_url: &str) -> Vec<String> {
    match xml_source::read_xml_source(transport, feed_url, &FEED_SOURCE).await {
        Ok(links) => links,
        Err(e) => {
            warn!(feed = %feed_url, error = %e, "feed discovery failed");
            Vec::new()
        }
    }
}

/// Parse feed XML into item links.
pub fn parse_feed(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    xml_source::extract_paths(xml, FEED_RULES)
}
