//! Write buffering in front of a [`UrlStore`].

use super::{CheckedRecord, SeenRecord, UrlStore};
use crate::error::StoreError;
use std::sync::Arc;
use tracing::debug;

/// Maximum rows per `upsert_seen` call.
pub const SEEN_CHUNK_SIZE: usize = 200;

/// Buffers store writes owned by one run and flushes them in batches.
///
/// A flush writes every buffered seen row before any check patch, so a
/// reader never observes a check without its seen row.
pub struct BatchRecorder {
    store: Arc<dyn UrlStore>,
    seen: Vec<SeenRecord>,
    checked: Vec<CheckedRecord>,
}

impl BatchRecorder {
    pub fn new(store: Arc<dyn UrlStore>) -> Self {
        Self {
            store,
            seen: Vec::new(),
            checked: Vec::new(),
        }
    }

    pub fn record_seen(&mut self, row: SeenRecord) {
        self.seen.push(row);
    }

    pub fn record_checked(&mut self, patch: CheckedRecord) {
        self.checked.push(patch);
    }

    /// Buffered (seen, checked) counts.
    pub fn pending(&self) -> (usize, usize) {
        (self.seen.len(), self.checked.len())
    }

    pub fn store(&self) -> &Arc<dyn UrlStore> {
        &self.store
    }

    /// Write out both buffers. Any store error is returned to the caller.
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        let seen = std::mem::take(&mut self.seen);
        let checked = std::mem::take(&mut self.checked);
        if seen.is_empty() && checked.is_empty() {
            return Ok(());
        }
        debug!(seen = seen.len(), checked = checked.len(), "flushing store buffers");

        for chunk in seen.chunks(SEEN_CHUNK_SIZE) {
            self.store.upsert_seen(chunk).await?;
        }
        if !checked.is_empty() {
            self.store.update_checked(&checked).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::discovery::DiscoverySource;
    use crate::store::UrlStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CallLog {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl UrlStore for CallLog {
        async fn upsert_seen(&self, rows: &[SeenRecord]) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Config("down".into()));
            }
            self.calls.lock().unwrap().push(format!("seen:{}", rows.len()));
            Ok(())
        }

        async fn update_checked(&self, patches: &[CheckedRecord]) -> Result<(), StoreError> {
            self.calls.lock().unwrap().push(format!("checked:{}", patches.len()));
            Ok(())
        }

        async fn count(&self) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    fn seen(i: usize) -> SeenRecord {
        SeenRecord {
            url: format!("https://a.ca/{i}/"),
            domain: "a.ca".into(),
            depth: 0,
            source_type: DiscoverySource::Seed,
            discovered_from: None,
        }
    }

    fn checked(i: usize) -> CheckedRecord {
        CheckedRecord {
            url: format!("https://a.ca/{i}/"),
            status: UrlStatus::Visited,
            relevant: true,
            score: 3,
            reason: "url score".into(),
            http_status: Some(200),
            content_type: Some("text/html".into()),
        }
    }

    #[tokio::test]
    async fn test_flush_writes_seen_before_checked_in_chunks() {
        let log = Arc::new(CallLog::default());
        let mut recorder = BatchRecorder::new(log.clone());
        recorder.record_checked(checked(0));
        for i in 0..450 {
            recorder.record_seen(seen(i));
        }
        assert_eq!(recorder.pending(), (450, 1));

        recorder.flush().await.unwrap();
        assert_eq!(recorder.pending(), (0, 0));
        assert_eq!(
            *log.calls.lock().unwrap(),
            vec!["seen:200", "seen:200", "seen:50", "checked:1"]
        );

        // Empty flush is a no-op.
        recorder.flush().await.unwrap();
        assert_eq!(log.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_flush_propagates_store_errors() {
        let log = Arc::new(CallLog {
            fail: true,
            ..Default::default()
        });
        let mut recorder = BatchRecorder::new(log.clone());
        recorder.record_seen(seen(1));
        recorder.record_checked(checked(1));
        assert!(matches!(recorder.flush().await, Err(StoreError::Config(_))));
        assert!(log.calls.lock().unwrap().is_empty());
    }
}
