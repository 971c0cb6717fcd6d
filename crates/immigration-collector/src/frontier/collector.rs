//! Breadth-first collection run: discover, admit, fetch, score, record.

use crate::acquisition::discovery::{DiscoveryAggregator, DiscoveryEvent};
use crate::acquisition::http_client::{FetchResponse, Transport, ACCEPT_ANY};
use crate::acquisition::page_extractor::ContentExtractor;
use crate::config::CollectorConfig;
use crate::error::{CollectorError, FetchError};
use crate::frontier::admission::{AdmissionFilter, Rejection};
use crate::frontier::politeness::PolitenessScheduler;
use crate::frontier::queue::{Frontier, FrontierEntry};
use crate::frontier::scorer::{Decision, RelevanceScorer, ScoreResult};
use crate::frontier::stats::RunStats;
use crate::store::{BatchRecorder, CheckedRecord, SeenRecord, UrlStatus, UrlStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns every piece of state for one run.
///
/// A collector is single-use: construct one per run so the dedup set,
/// politeness timestamps, buffers and counters start empty.
pub struct Collector {
    config: CollectorConfig,
    transport: Arc<dyn Transport>,
    recorder: BatchRecorder,
    filter: AdmissionFilter,
    scorer: RelevanceScorer,
    extractor: ContentExtractor,
    politeness: PolitenessScheduler,
    frontier: Frontier,
    stats: RunStats,
}

impl Collector {
    pub fn new(
        config: CollectorConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn UrlStore>,
    ) -> Self {
        Self {
            filter: AdmissionFilter::new(&config.allowed_domains, &config.filter),
            scorer: RelevanceScorer::new(&config.filter),
            extractor: ContentExtractor::new(&config.filter.main_content_selectors),
            politeness: PolitenessScheduler::from_millis(config.crawl.per_domain_delay_ms),
            recorder: BatchRecorder::new(store),
            frontier: Frontier::new(),
            stats: RunStats::new(),
            transport,
            config,
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Execute the run: discovery, one flush, then drain the frontier.
    ///
    /// Only store failures abort the run; fetch and discovery failures are
    /// counted and skipped.
    pub async fn run(&mut self) -> Result<RunStats, CollectorError> {
        info!(
            seeds = self.config.seed_urls.len(),
            feeds = self.config.rss_feeds.len(),
            sitemaps = self.config.sitemaps.len(),
            max_depth = self.config.crawl.max_depth,
            max_pages = self.config.crawl.max_pages_per_run,
            "collection run starting"
        );

        self.discover().await;
        self.recorder.flush().await?;
        info!(
            discovered = self.stats.discovered,
            enqueued = self.stats.enqueued,
            "discovery complete"
        );

        self.drain().await?;
        self.recorder.flush().await?;

        let total = self.recorder.store().count().await?;
        info!(
            processed = self.stats.processed,
            fetched = self.stats.fetched,
            kept = self.stats.kept,
            rejected = self.stats.rejected,
            failed = self.stats.failed,
            remaining = self.frontier.len(),
            stored = total,
            "collection run finished"
        );
        Ok(self.stats.clone())
    }

    /// Offer every seed, feed item and sitemap location at depth 0.
    pub async fn discover(&mut self) {
        let aggregator = DiscoveryAggregator::new(
            self.transport.as_ref(),
            &self.config.seed_urls,
            &self.config.rss_feeds,
            &self.config.sitemaps,
        );
        let (events, counts) = aggregator.initial_events().await;

        self.stats.record_reader_counts(counts);
        for event in &events {
            self.offer(event);
        }
    }

    /// Run one event through canonicalization and admission.
    ///
    /// Admitted URLs are enqueued and buffered as seen rows. Returns whether
    /// the event was admitted.
    pub fn offer(&mut self, event: &DiscoveryEvent) -> bool {
        self.stats.record_event(event.source);

        match self.frontier.offer(
            event,
            &self.filter,
            &self.config.filter.drop_query_params_prefix,
        ) {
            Ok(entry) => {
                self.stats.enqueued += 1;
                self.recorder.record_seen(SeenRecord {
                    url: entry.url.to_string(),
                    domain: entry.url.domain().to_string(),
                    depth: entry.depth,
                    source_type: entry.source,
                    discovered_from: entry.discovered_from,
                });
                true
            }
            Err(Rejection::Duplicate) => {
                self.stats.duplicates += 1;
                false
            }
            Err(reason) => {
                self.stats.filtered += 1;
                debug!(url = %event.raw_url, %reason, "not admitted");
                false
            }
        }
    }

    /// Pop entries until the queue is empty or the page budget is spent.
    pub async fn drain(&mut self) -> Result<(), CollectorError> {
        let max_pages = self.config.crawl.max_pages_per_run as u64;
        let flush_every = self.config.crawl.flush_every as u64;
        let progress_every = self.config.crawl.progress_every as u64;

        while self.stats.processed < max_pages {
            let Some(entry) = self.frontier.pop() else {
                break;
            };
            self.stats.processed += 1;
            self.process_entry(entry).await;

            if self.stats.processed % flush_every == 0 {
                self.recorder.flush().await?;
            }
            if self.stats.processed % progress_every == 0 {
                let total = self.recorder.store().count().await?;
                info!(
                    processed = self.stats.processed,
                    kept = self.stats.kept,
                    failed = self.stats.failed,
                    queue = self.frontier.len(),
                    stored = total,
                    "progress"
                );
            }
        }

        if !self.frontier.is_empty() {
            info!(
                remaining = self.frontier.len(),
                "page budget reached; remaining entries dropped"
            );
        }
        Ok(())
    }

    /// Fetch one entry, score it, record the outcome and feed its children.
    async fn process_entry(&mut self, entry: FrontierEntry) {
        self.politeness.wait_if_needed(entry.url.domain()).await;

        let resp = match self.fetch(&entry).await {
            Ok(resp) => resp,
            Err(e) => {
                self.stats.failed += 1;
                warn!(url = %entry.url, error = %e, "fetch failed");
                self.recorder.record_checked(CheckedRecord {
                    url: entry.url.to_string(),
                    status: UrlStatus::Failed,
                    relevant: false,
                    score: 0,
                    reason: e.to_string(),
                    http_status: e.http_status(),
                    content_type: None,
                });
                return;
            }
        };

        let url_score = self.scorer.score_url(entry.url.as_str());
        let (text_score, links) = if resp.is_html() {
            let content = self.extractor.extract(&resp.final_url, &resp.body);
            (self.scorer.score_text(&content.text), content.links)
        } else {
            (ScoreResult::no_text_scoring(), Vec::new())
        };
        let decision = self.scorer.decide(url_score, text_score);
        self.stats.record_decision(decision.keep);

        debug!(
            url = %entry.url,
            depth = entry.depth,
            score = decision.total,
            keep = decision.keep,
            links = links.len(),
            "scored"
        );
        self.recorder
            .record_checked(checked_record(&entry, &resp, &decision));

        if decision.keep && entry.depth < self.config.crawl.max_depth {
            let parent = entry.url.to_string();
            for link in &links {
                self.offer(&DiscoveryEvent::crawled(link, &parent, entry.depth));
            }
        }
    }

    async fn fetch(&self, entry: &FrontierEntry) -> Result<FetchResponse, FetchError> {
        let resp = self.transport.fetch(entry.url.as_str(), ACCEPT_ANY).await?;
        if !resp.is_success() {
            return Err(FetchError::Status {
                status: resp.status,
                url: entry.url.to_string(),
            });
        }
        Ok(resp)
    }
}

fn checked_record(
    entry: &FrontierEntry,
    resp: &FetchResponse,
    decision: &Decision,
) -> CheckedRecord {
    CheckedRecord {
        url: entry.url.to_string(),
        status: UrlStatus::Visited,
        relevant: decision.keep,
        score: decision.total,
        reason: decision.reason(),
        http_status: Some(resp.status),
        content_type: (!resp.content_type.is_empty()).then(|| resp.content_type.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::discovery::DiscoverySource;
    use crate::acquisition::http_client::tests::StaticTransport;
    use crate::config::tests::minimal_config;
    use crate::store::MemoryStore;

    fn collector(
        transport: StaticTransport,
        f: impl FnOnce(&mut CollectorConfig),
    ) -> (Collector, Arc<MemoryStore>) {
        let mut cfg = minimal_config();
        f(&mut cfg);
        let store = Arc::new(MemoryStore::new());
        (Collector::new(cfg, Arc::new(transport), store.clone()), store)
    }

    #[tokio::test]
    async fn test_offer_counts_by_outcome() {
        let (mut c, _) = collector(StaticTransport::default(), |_| {});
        assert!(c.offer(&DiscoveryEvent::seed("https://example.gc.ca/a")));
        assert!(!c.offer(&DiscoveryEvent::seed("https://example.gc.ca/a/#frag")));
        assert!(!c.offer(&DiscoveryEvent::seed("https://elsewhere.ca/")));
        assert!(!c.offer(&DiscoveryEvent::seed("::")));

        let stats = c.stats();
        assert_eq!(stats.discovered, 4);
        assert_eq!(stats.enqueued, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.filtered, 2);
        assert_eq!(stats.from_source(DiscoverySource::Seed), 4);
    }

    #[tokio::test]
    async fn test_non_html_scored_by_url_only() {
        let transport = StaticTransport::default().with(
            "https://example.gc.ca/docs/guide.pdf",
            200,
            "application/pdf",
            "%PDF-1.7",
        );
        let (mut c, store) = collector(transport, |cfg| {
            cfg.seed_urls = vec!["https://example.gc.ca/docs/guide.pdf".into()];
            cfg.filter.immigration_terms = vec!["guide".into()];
            cfg.filter.score_threshold = 2;
        });

        let stats = c.run().await.unwrap();
        assert_eq!((stats.fetched, stats.kept), (1, 1));

        let row = store.get("https://example.gc.ca/docs/guide.pdf").unwrap();
        let checked = row.checked.unwrap();
        assert_eq!(checked.status, UrlStatus::Visited);
        assert_eq!(checked.score, 2);
        assert_eq!(checked.reason, "url: +2 url term match; text: no text scoring");
        assert_eq!(checked.content_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_error_status_is_a_failure() {
        let transport =
            StaticTransport::default().with("https://example.gc.ca/gone/", 410, "text/html", "");
        let (mut c, store) = collector(transport, |cfg| {
            cfg.seed_urls = vec!["https://example.gc.ca/gone".into()];
        });

        let stats = c.run().await.unwrap();
        assert_eq!((stats.processed, stats.fetched, stats.failed), (1, 0, 1));
        let checked = store.get("https://example.gc.ca/gone/").unwrap().checked.unwrap();
        assert_eq!(checked.status, UrlStatus::Failed);
        assert_eq!(checked.http_status, Some(410));
        assert!(!checked.relevant);
    }
}
