//! Local JSON file store (`data/urls.json`).

use super::{CheckedRecord, SeenRecord, UrlStatus, UrlStore};
use crate::acquisition::discovery::DiscoverySource;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Default location of the file store, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/urls.json";

/// One persisted URL row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUrl {
    pub url: String,
    pub domain: String,
    pub depth: u32,
    pub source_type: DiscoverySource,
    pub discovered_from: Option<String>,
    pub score: i64,
    pub reason: String,
    pub relevant: bool,
    pub status: UrlStatus,
    pub first_seen_at: String,
    pub last_seen_at: String,
    pub last_checked_at: Option<String>,
    pub http_status: Option<u16>,
    pub content_type: Option<String>,
}

/// Keeps every row in memory and rewrites the whole file on each write.
pub struct JsonFileStore {
    path: PathBuf,
    rows: Mutex<BTreeMap<String, StoredUrl>>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating it lazily on first write.
    ///
    /// A file that fails to parse is moved aside to
    /// `<stem>.corrupt.<millis>.json` and the store starts empty.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let rows = load_rows(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            rows: Mutex::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, url: &str) -> Option<StoredUrl> {
        self.lock_rows().get(url).cloned()
    }

    fn lock_rows(&self) -> MutexGuard<'_, BTreeMap<String, StoredUrl>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write all rows sorted by URL, via a temp file and rename.
    fn save(&self, rows: &BTreeMap<String, StoredUrl>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let list: Vec<&StoredUrl> = rows.values().collect();
        let json = serde_json::to_string_pretty(&list)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn load_rows(path: &Path) -> Result<BTreeMap<String, StoredUrl>, StoreError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let raw = std::fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    match serde_json::from_str::<Vec<StoredUrl>>(&raw) {
        Ok(list) => Ok(list.into_iter().map(|r| (r.url.clone(), r)).collect()),
        Err(e) => {
            let backup = corrupt_backup_path(path);
            match std::fs::rename(path, &backup) {
                Ok(()) => warn!(
                    "store file {} was corrupt ({e}); moved to {}",
                    path.display(),
                    backup.display()
                ),
                Err(rename_err) => warn!(
                    "store file {} was corrupt ({e}) and could not be moved ({rename_err}); starting fresh",
                    path.display()
                ),
            }
            Ok(BTreeMap::new())
        }
    }
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "urls".to_string());
    let millis = Utc::now().timestamp_millis();
    path.with_file_name(format!("{stem}.corrupt.{millis}.json"))
}

#[async_trait]
impl UrlStore for JsonFileStore {
    async fn upsert_seen(&self, rows: &[SeenRecord]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let now = Utc::now().to_rfc3339();
        let mut map = self.lock_rows();
        for row in rows {
            match map.get_mut(&row.url) {
                Some(existing) => {
                    existing.domain = row.domain.clone();
                    existing.depth = row.depth;
                    existing.source_type = row.source_type;
                    existing.discovered_from = row.discovered_from.clone();
                    existing.last_seen_at = now.clone();
                }
                None => {
                    map.insert(
                        row.url.clone(),
                        StoredUrl {
                            url: row.url.clone(),
                            domain: row.domain.clone(),
                            depth: row.depth,
                            source_type: row.source_type,
                            discovered_from: row.discovered_from.clone(),
                            score: 0,
                            reason: String::new(),
                            relevant: false,
                            status: UrlStatus::Pending,
                            first_seen_at: now.clone(),
                            last_seen_at: now.clone(),
                            last_checked_at: None,
                            http_status: None,
                            content_type: None,
                        },
                    );
                }
            }
        }
        self.save(&map)
    }

    async fn update_checked(&self, patches: &[CheckedRecord]) -> Result<(), StoreError> {
        if patches.is_empty() {
            return Ok(());
        }
        let now = Utc::now().to_rfc3339();
        let mut map = self.lock_rows();
        for patch in patches {
            let Some(row) = map.get_mut(&patch.url) else {
                continue;
            };
            row.status = patch.status;
            row.relevant = patch.relevant;
            row.score = patch.score;
            row.reason = patch.reason.clone();
            row.http_status = patch.http_status;
            row.content_type = patch.content_type.clone();
            row.last_checked_at = Some(now.clone());
            row.last_seen_at = now.clone();
        }
        self.save(&map)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lock_rows().len() as u64)
    }
}
