//! Error types shared across the collector.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration could not be read or failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A page fetch failed. Terminal for that URL within the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },
}

impl FetchError {
    /// HTTP status attached to the failure, if the server answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// A feed or sitemap could not be read. Isolated to that source.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("http status {0}")]
    Status(u16),
    #[error("not xml (content-type {content_type:?}), body starts: {preview}")]
    NotXml {
        content_type: String,
        preview: String,
    },
    #[error("xml parse failed: {source}, body starts: {preview}")]
    Parse {
        #[source]
        source: quick_xml::Error,
        preview: String,
    },
}

/// A store write or read failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store rejected {operation} with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("store misconfigured: {0}")]
    Config(String),
}

/// Fatal errors that end a collection run.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
