//! Persistence of discovery and check results.
//!
//! The collector never writes directly: it buffers [`SeenRecord`]s and
//! [`CheckedRecord`]s in a [`BatchRecorder`], which flushes them to a
//! [`UrlStore`] with seen rows always ahead of the check patches.

pub mod json_file;
pub mod memory;
pub mod recorder;
pub mod rest;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use recorder::BatchRecorder;
pub use rest::RestStore;

use crate::acquisition::discovery::DiscoverySource;
use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a stored URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStatus {
    Pending,
    Visited,
    Failed,
}

/// A URL admitted to the frontier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub url: String,
    pub domain: String,
    pub depth: u32,
    pub source_type: DiscoverySource,
    pub discovered_from: Option<String>,
}

/// Outcome of fetching and scoring a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckedRecord {
    pub url: String,
    pub status: UrlStatus,
    pub relevant: bool,
    pub score: i64,
    pub reason: String,
    pub http_status: Option<u16>,
    pub content_type: Option<String>,
}

/// Backing store for collected URLs.
///
/// `upsert_seen` must be an idempotent insert-or-update keyed by URL.
/// `update_checked` patches existing rows and ignores unknown URLs.
#[async_trait]
pub trait UrlStore: Send + Sync {
    async fn upsert_seen(&self, rows: &[SeenRecord]) -> Result<(), StoreError>;

    async fn update_checked(&self, patches: &[CheckedRecord]) -> Result<(), StoreError>;

    /// Total number of stored URLs.
    async fn count(&self) -> Result<u64, StoreError>;
}
