//! Collector configuration, loaded from a JSON file and validated up front.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/collector.config.json";

/// Domain whose legacy `canada_path_must_start_with` list maps onto `path_scopes`.
const LEGACY_SCOPED_DOMAIN: &str = "www.canada.ca";

/// Top-level collector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub user_agent: String,
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub seed_urls: Vec<String>,
    #[serde(default)]
    pub rss_feeds: Vec<String>,
    #[serde(default)]
    pub sitemaps: Vec<String>,
    pub crawl: CrawlConfig,
    pub filter: FilterConfig,
}

/// Traversal limits and batching cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub max_depth: u32,
    pub max_pages_per_run: usize,
    pub per_domain_delay_ms: u64,
    pub timeout_ms: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Flush buffered store writes after this many processed entries.
    #[serde(default = "default_flush_every")]
    pub flush_every: usize,
    /// Log a progress snapshot after this many processed entries.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

/// Admission and scoring rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Enables the per-domain language prefix rules.
    #[serde(default)]
    pub english_only: bool,
    /// Domain -> required (lowercase) path prefix for the language section.
    #[serde(default)]
    pub language_prefixes: BTreeMap<String, String>,
    /// Domain -> allowed path prefixes. An empty list disables the rule.
    #[serde(default)]
    pub path_scopes: BTreeMap<String, Vec<String>>,
    /// Legacy spelling of `path_scopes["www.canada.ca"]`.
    #[serde(default, skip_serializing)]
    pub canada_path_must_start_with: Option<Vec<String>>,
    #[serde(default = "default_content_selectors")]
    pub main_content_selectors: Vec<String>,
    #[serde(default)]
    pub immigration_terms: Vec<String>,
    #[serde(default)]
    pub drop_extensions: Vec<String>,
    #[serde(default)]
    pub drop_path_contains: Vec<String>,
    #[serde(default)]
    pub drop_query_params_prefix: Vec<String>,
    /// Substrings that mark a URL as trusted, on top of the built-in legal sources.
    #[serde(default)]
    pub always_keep_contains: Vec<String>,
    pub score_threshold: i64,
    #[serde(default)]
    pub score_rules: ScoreRules,
}

/// Weighted substring tables used by the URL scorer.
///
/// * `domain_bonus`: lowercase host -> bonus added once.
/// * `contains_bonus`: substring -> weight added for every matching entry.
/// * `contains_penalty`: substring -> weight subtracted for every matching entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreRules {
    #[serde(default)]
    pub domain_bonus: BTreeMap<String, i64>,
    #[serde(default)]
    pub contains_bonus: BTreeMap<String, i64>,
    #[serde(default)]
    pub contains_penalty: BTreeMap<String, i64>,
}

fn default_max_redirects() -> usize {
    5
}

fn default_flush_every() -> usize {
    25
}

fn default_progress_every() -> usize {
    25
}

fn default_content_selectors() -> Vec<String> {
    ["main", "[role='main']", "#main-content", "article"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl CollectorConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate a config from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut cfg: CollectorConfig = serde_json::from_str(raw)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Lowercase domain keys and fold legacy fields into their typed homes.
    fn normalize(&mut self) {
        self.allowed_domains = self
            .allowed_domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .collect();

        let filter = &mut self.filter;
        if let Some(prefixes) = filter.canada_path_must_start_with.take() {
            filter
                .path_scopes
                .entry(LEGACY_SCOPED_DOMAIN.to_string())
                .or_default()
                .extend(prefixes);
        }

        filter.language_prefixes = std::mem::take(&mut filter.language_prefixes)
            .into_iter()
            .map(|(domain, prefix)| (domain.to_lowercase(), prefix.to_lowercase()))
            .collect();
        filter.path_scopes = std::mem::take(&mut filter.path_scopes)
            .into_iter()
            .map(|(domain, prefixes)| (domain.to_lowercase(), prefixes))
            .collect();
        filter.score_rules.domain_bonus = std::mem::take(&mut filter.score_rules.domain_bonus)
            .into_iter()
            .map(|(domain, bonus)| (domain.to_lowercase(), bonus))
            .collect();
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be empty".into()));
        }
        if self.allowed_domains.is_empty() {
            return Err(ConfigError::Invalid(
                "allowed_domains must list at least one domain".into(),
            ));
        }
        if self.crawl.max_pages_per_run == 0 {
            return Err(ConfigError::Invalid(
                "crawl.max_pages_per_run must be greater than zero".into(),
            ));
        }
        if self.crawl.flush_every == 0 || self.crawl.progress_every == 0 {
            return Err(ConfigError::Invalid(
                "crawl.flush_every and crawl.progress_every must be greater than zero".into(),
            ));
        }
        for selector in &self.filter.main_content_selectors {
            scraper::Selector::parse(selector).map_err(|e| {
                ConfigError::Invalid(format!("invalid content selector `{selector}`: {e:?}"))
            })?;
        }
        Ok(())
    }
}
