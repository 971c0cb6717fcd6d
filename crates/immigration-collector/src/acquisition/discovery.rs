//! Discovery aggregator: seeds, feeds, sitemaps and crawled links as one stream.

use crate::acquisition::feed_parser;
use crate::acquisition::http_client::Transport;
use crate::acquisition::sitemap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Where a URL was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    Seed,
    /// RSS or Atom feed item. Stored as `rss` for compatibility.
    #[serde(rename = "rss")]
    Feed,
    Sitemap,
    Crawl,
}

impl DiscoverySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoverySource::Seed => "seed",
            DiscoverySource::Feed => "rss",
            DiscoverySource::Sitemap => "sitemap",
            DiscoverySource::Crawl => "crawl",
        }
    }
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate URL before canonicalization and admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEvent {
    pub raw_url: String,
    /// BFS depth from a seed; seeds, feed items and sitemap entries are 0.
    pub depth: u32,
    pub source: DiscoverySource,
    pub discovered_from: Option<String>,
}

impl DiscoveryEvent {
    pub fn seed(url: &str) -> Self {
        Self {
            raw_url: url.to_string(),
            depth: 0,
            source: DiscoverySource::Seed,
            discovered_from: None,
        }
    }

    /// A link found on a crawled page at `parent_depth`.
    pub fn crawled(link: &str, parent_url: &str, parent_depth: u32) -> Self {
        Self {
            raw_url: link.to_string(),
            depth: parent_depth + 1,
            source: DiscoverySource::Crawl,
            discovered_from: Some(parent_url.to_string()),
        }
    }

    fn from_reader(url: String, source: DiscoverySource, origin: &str) -> Self {
        Self {
            raw_url: url,
            depth: 0,
            source,
            discovered_from: Some(origin.to_string()),
        }
    }
}

/// Item counts read from each reader during the discovery stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderCounts {
    pub feed_items: u64,
    pub sitemap_urls: u64,
}

/// Gathers the depth-0 discovery events for a run.
pub struct DiscoveryAggregator<'a> {
    transport: &'a dyn Transport,
    seeds: &'a [String],
    feeds: &'a [String],
    sitemaps: &'a [String],
}

impl<'a> DiscoveryAggregator<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        seeds: &'a [String],
        feeds: &'a [String],
        sitemaps: &'a [String],
    ) -> Self {
        Self {
            transport,
            seeds,
            feeds,
            sitemaps,
        }
    }

    /// Seeds first, then every feed, then every sitemap.
    ///
    /// A failing feed or sitemap contributes nothing and never stops the others.
    pub async fn initial_events(&self) -> (Vec<DiscoveryEvent>, ReaderCounts) {
        let mut events: Vec<DiscoveryEvent> =
            self.seeds.iter().map(|s| DiscoveryEvent::seed(s)).collect();
        let mut counts = ReaderCounts::default();

        for feed in self.feeds {
            let links = feed_parser::discover_from_feed(self.transport, feed).await;
            info!(feed = %feed, items = links.len(), "read feed");
            counts.feed_items += links.len() as u64;
            events.extend(
                links
                    .into_iter()
                    .map(|u| DiscoveryEvent::from_reader(u, DiscoverySource::Feed, feed)),
            );
        }

        for sm in self.sitemaps {
            let locs = sitemap::discover_from_sitemap(self.transport, sm).await;
            info!(sitemap = %sm, urls = locs.len(), "read sitemap");
            counts.sitemap_urls += locs.len() as u64;
            events.extend(
                locs.into_iter()
                    .map(|u| DiscoveryEvent::from_reader(u, DiscoverySource::Sitemap, sm)),
            );
        }

        (events, counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::http_client::tests::StaticTransport;

    #[tokio::test]
    async fn test_initial_events_order_and_isolation() {
        let transport = StaticTransport::default()
            .with(
                "https://a.ca/feed.xml",
                200,
                "application/rss+xml",
                r#"<rss><channel><item><link>https://a.ca/news/1</link></item></channel></rss>"#,
            )
            .with("https://a.ca/broken.xml", 200, "text/html", "<html>oops</html>")
            .with(
                "https://a.ca/sitemap.xml",
                200,
                "application/xml",
                r#"<sitemapindex><sitemap><loc>https://a/sm2.xml</loc></sitemap></sitemapindex>"#,
            );
        let seeds = vec!["https://a.ca/en/".to_string()];
        let feeds = vec![
            "https://a.ca/broken.xml".to_string(),
            "https://a.ca/feed.xml".to_string(),
        ];
        let sitemaps = vec!["https://a.ca/sitemap.xml".to_string()];

        let aggregator = DiscoveryAggregator::new(&transport, &seeds, &feeds, &sitemaps);
        let (events, counts) = aggregator.initial_events().await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], DiscoveryEvent::seed("https://a.ca/en/"));
        assert_eq!(events[1].source, DiscoverySource::Feed);
        assert_eq!(events[1].raw_url, "https://a.ca/news/1");
        assert_eq!(events[1].discovered_from.as_deref(), Some("https://a.ca/feed.xml"));
        assert_eq!(events[2].source, DiscoverySource::Sitemap);
        assert_eq!(events[2].raw_url, "https://a/sm2.xml");
        assert_eq!(events[2].depth, 0);
        assert_eq!(counts, ReaderCounts { feed_items: 1, sitemap_urls: 1 });
    }

    #[test]
    fn test_crawled_event_depth() {
        let e = DiscoveryEvent::crawled("/child", "https://a.ca/p/", 1);
        assert_eq!(e.depth, 2);
        assert_eq!(e.source, DiscoverySource::Crawl);
        assert_eq!(e.discovered_from.as_deref(), Some("https://a.ca/p/"));
    }

    #[test]
    fn test_source_serializes_like_store_column() {
        assert_eq!(serde_json::to_string(&DiscoverySource::Feed).unwrap(), "\"rss\"");
        assert_eq!(serde_json::to_string(&DiscoverySource::Crawl).unwrap(), "\"crawl\"");
    }
}
