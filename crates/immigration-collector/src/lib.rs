//! Frontier and relevance engine for collecting Canadian immigration law and
//! policy URLs.
//!
//! Seeds, RSS/Atom feeds and sitemaps feed a single breadth-first frontier.
//! Every discovered URL is canonicalized, passed through the admission filter,
//! fetched under a per-domain politeness delay, scored for topical relevance,
//! and recorded in a [`store::UrlStore`] in batches.

pub mod acquisition;
pub mod config;
pub mod error;
pub mod frontier;
pub mod store;

pub use config::CollectorConfig;
pub use error::CollectorError;
pub use frontier::collector::Collector;
pub use frontier::stats::RunStats;
