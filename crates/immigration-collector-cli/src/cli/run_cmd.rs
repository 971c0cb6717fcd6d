//! `immigration-collector run`: one collection pass against the chosen store.

use crate::cli::output::{self, Styled};
use anyhow::{Context, Result};
use clap::ValueEnum;
use immigration_collector::acquisition::http_client::HttpClient;
use immigration_collector::store::{JsonFileStore, MemoryStore, RestStore, UrlStore};
use immigration_collector::{Collector, CollectorConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Backing store for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Local JSON file (`--data`)
    Json,
    /// PostgREST/Supabase table, credentials from the environment
    Rest,
    /// In-process only; nothing is persisted
    Memory,
}

pub fn open_store(kind: StoreKind, data: &Path) -> Result<Arc<dyn UrlStore>> {
    let store: Arc<dyn UrlStore> = match kind {
        StoreKind::Json => Arc::new(
            JsonFileStore::open(data)
                .with_context(|| format!("opening json store {}", data.display()))?,
        ),
        StoreKind::Rest => {
            Arc::new(RestStore::from_env().context("configuring rest store from environment")?)
        }
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

pub async fn run(
    config_path: &Path,
    store_kind: StoreKind,
    data: &Path,
    max_pages: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut cfg = CollectorConfig::load(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    if let Some(n) = max_pages {
        anyhow::ensure!(n > 0, "--max-pages must be greater than zero");
        cfg.crawl.max_pages_per_run = n;
    }

    let store = open_store(store_kind, data)?;
    let transport = Arc::new(HttpClient::from_config(&cfg).context("building http client")?);
    info!(config = %config_path.display(), store = ?store_kind, "starting collector");

    let start = Instant::now();
    let mut collector = Collector::new(cfg, transport, store);
    let stats = collector.run().await.context("collection run failed")?;

    if json {
        output::print_json(&serde_json::to_value(&stats)?);
    } else {
        output::print_run_summary(&Styled::new(), &stats, start.elapsed());
    }
    Ok(())
}
