//! In-process store for dry runs and tests.

use super::{CheckedRecord, SeenRecord, UrlStatus, UrlStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A stored row: the latest seen record plus the latest check, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRow {
    pub seen: SeenRecord,
    pub checked: Option<CheckedRecord>,
}

impl MemoryRow {
    pub fn status(&self) -> UrlStatus {
        self.checked
            .as_ref()
            .map(|c| c.status)
            .unwrap_or(UrlStatus::Pending)
    }
}

/// Keeps rows in a map keyed by URL.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, MemoryRow>>,
    flushes: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<MemoryRow> {
        self.lock_rows().get(url).cloned()
    }

    pub fn rows(&self) -> Vec<MemoryRow> {
        self.lock_rows().values().cloned().collect()
    }

    /// Number of non-empty `upsert_seen` batches received.
    pub fn seen_batches(&self) -> u64 {
        *self.flushes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_rows(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, MemoryRow>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UrlStore for MemoryStore {
    async fn upsert_seen(&self, rows: &[SeenRecord]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut map = self.lock_rows();
        for row in rows {
            map.entry(row.url.clone())
                .and_modify(|existing| existing.seen = row.clone())
                .or_insert_with(|| MemoryRow {
                    seen: row.clone(),
                    checked: None,
                });
        }
        *self.flushes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }

    async fn update_checked(&self, patches: &[CheckedRecord]) -> Result<(), StoreError> {
        let mut map = self.lock_rows();
        for patch in patches {
            if let Some(row) = map.get_mut(&patch.url) {
                row.checked = Some(patch.clone());
            }
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lock_rows().len() as u64)
    }
}
