//! Run-scoped FIFO frontier with deduplicated admission.

use crate::acquisition::discovery::{DiscoveryEvent, DiscoverySource};
use crate::frontier::admission::{AdmissionFilter, Rejection};
use crate::frontier::canonical::{canonicalize, CanonicalUrl};
use std::collections::{HashSet, VecDeque};

/// A URL admitted to this run's frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: CanonicalUrl,
    pub depth: u32,
    pub source: DiscoverySource,
    pub discovered_from: Option<String>,
}

/// Breadth-first work queue. A canonical URL is admitted at most once per run.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    admitted: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize, filter and enqueue a discovery event.
    ///
    /// The duplicate check and the push happen under the same `&mut self`, so
    /// an entry can never be queued twice.
    pub fn offer<S: AsRef<str>>(
        &mut self,
        event: &DiscoveryEvent,
        filter: &AdmissionFilter,
        drop_query_prefixes: &[S],
    ) -> Result<FrontierEntry, Rejection> {
        let url = canonicalize(&event.raw_url, drop_query_prefixes).ok_or(Rejection::Malformed)?;
        filter.evaluate(&url)?;

        if !self.admitted.insert(url.as_str().to_string()) {
            return Err(Rejection::Duplicate);
        }

        let entry = FrontierEntry {
            url,
            depth: event.depth,
            source: event.source,
            discovered_from: event.discovered_from.clone(),
        };
        self.queue.push_back(entry.clone());
        Ok(entry)
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Entries still waiting to be processed.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Distinct canonical URLs admitted so far this run.
    pub fn admitted(&self) -> usize {
        self.admitted.len()
    }
}
