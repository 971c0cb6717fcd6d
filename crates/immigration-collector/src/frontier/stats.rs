//! Per-run counters.

use crate::acquisition::discovery::{DiscoverySource, ReaderCounts};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters for one collection run.
///
/// `kept + rejected == fetched` and `fetched + failed == processed` hold at
/// every point of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Events offered to admission, including ones that were filtered out.
    pub discovered: u64,
    pub enqueued: u64,
    /// Events refused by the admission predicates or malformed.
    pub filtered: u64,
    /// Events whose canonical URL was already admitted this run.
    pub duplicates: u64,
    pub processed: u64,
    pub fetched: u64,
    pub kept: u64,
    pub rejected: u64,
    pub failed: u64,
    /// Events offered, by source.
    pub by_source: BTreeMap<DiscoverySource, u64>,
    pub feed_items: u64,
    pub sitemap_urls: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_event(&mut self, source: DiscoverySource) {
        self.discovered += 1;
        *self.by_source.entry(source).or_insert(0) += 1;
    }

    pub(crate) fn record_reader_counts(&mut self, counts: ReaderCounts) {
        self.feed_items += counts.feed_items;
        self.sitemap_urls += counts.sitemap_urls;
    }

    pub(crate) fn record_decision(&mut self, keep: bool) {
        self.fetched += 1;
        if keep {
            self.kept += 1;
        } else {
            self.rejected += 1;
        }
    }

    /// Events offered from `source`.
    pub fn from_source(&self, source: DiscoverySource) -> u64 {
        self.by_source.get(&source).copied().unwrap_or(0)
    }
}
