//! PostgREST-compatible remote store (Supabase `urls` table).

use super::{CheckedRecord, SeenRecord, UrlStatus, UrlStore};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use serde::Serialize;
use std::time::Duration;

/// Environment variable holding the project base URL.
pub const URL_ENV: &str = "SUPABASE_URL";
/// Environment variable holding the service-role key.
pub const KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

const TABLE: &str = "urls";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct SeenPayload<'a> {
    url: &'a str,
    domain: &'a str,
    depth: u32,
    source_type: &'a str,
    discovered_from: Option<&'a str>,
    last_seen_at: &'a str,
}

#[derive(Serialize)]
struct CheckedPayload<'a> {
    status: UrlStatus,
    relevant: bool,
    score: i64,
    reason: &'a str,
    http_status: Option<u16>,
    content_type: Option<&'a str>,
    last_checked_at: &'a str,
    last_seen_at: &'a str,
}

/// Writes rows through the PostgREST HTTP API.
///
/// Seen rows are upserted on the `url` unique key. Check patches are plain
/// updates filtered by `url`, one request per patch, so unknown URLs are
/// silently left alone.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    endpoint: String,
}

impl RestStore {
    pub fn new(base_url: &str, service_key: &str) -> Result<Self, StoreError> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(StoreError::Config(format!("{URL_ENV} is empty")));
        }
        if service_key.trim().is_empty() {
            return Err(StoreError::Config(format!("{KEY_ENV} is empty")));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(service_key.trim())
            .map_err(|e| StoreError::Config(format!("invalid service key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", service_key.trim()))
            .map_err(|e| StoreError::Config(format!("invalid service key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{base}/rest/v1/{TABLE}"),
        })
    }

    /// Build from `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`.
    pub fn from_env() -> Result<Self, StoreError> {
        let url = std::env::var(URL_ENV)
            .map_err(|_| StoreError::Config(format!("missing {URL_ENV}")))?;
        let key = std::env::var(KEY_ENV)
            .map_err(|_| StoreError::Config(format!("missing {KEY_ENV}")))?;
        Self::new(&url, &key)
    }

    async fn check(
        operation: &'static str,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            operation,
            status: status.as_u16(),
            body,
        })
    }
}

/// Total from a `Content-Range` value such as `0-24/3573` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl UrlStore for RestStore {
    async fn upsert_seen(&self, rows: &[SeenRecord]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let now = Utc::now().to_rfc3339();
        let payload: Vec<SeenPayload<'_>> = rows
            .iter()
            .map(|r| SeenPayload {
                url: &r.url,
                domain: &r.domain,
                depth: r.depth,
                source_type: r.source_type.as_str(),
                discovered_from: r.discovered_from.as_deref(),
                last_seen_at: &now,
            })
            .collect();

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("on_conflict", "url")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&payload)
            .send()
            .await?;
        Self::check("upsert", resp).await?;
        Ok(())
    }

    async fn update_checked(&self, patches: &[CheckedRecord]) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        for patch in patches {
            let body = CheckedPayload {
                status: patch.status,
                relevant: patch.relevant,
                score: patch.score,
                reason: &patch.reason,
                http_status: patch.http_status,
                content_type: patch.content_type.as_deref(),
                last_checked_at: &now,
                last_seen_at: &now,
            };
            let resp = self
                .client
                .patch(&self.endpoint)
                .query(&[("url", format!("eq.{}", patch.url))])
                .header("Prefer", "return=minimal")
                .json(&body)
                .send()
                .await?;
            Self::check("update", resp).await?;
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let resp = self
            .client
            .head(&self.endpoint)
            .query(&[("select", "id")])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let resp = Self::check("count", resp).await?;
        Ok(resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0))
    }
}
