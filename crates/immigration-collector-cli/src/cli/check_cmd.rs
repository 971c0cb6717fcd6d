//! `immigration-collector check <url>`: offline admission and scoring diagnosis.

use crate::cli::output::{self, Styled};
use anyhow::{Context, Result};
use immigration_collector::frontier::admission::AdmissionFilter;
use immigration_collector::frontier::canonical::canonicalize;
use immigration_collector::frontier::scorer::RelevanceScorer;
use immigration_collector::CollectorConfig;
use serde::Serialize;
use std::path::Path;

/// What the collector would do with one URL, without fetching it.
#[derive(Debug, Serialize)]
pub struct Diagnosis {
    pub input: String,
    pub canonical: Option<String>,
    pub admitted: bool,
    /// Admission rejection, if any.
    pub rejection: Option<String>,
    pub url_score: i64,
    pub url_reason: String,
    pub trusted: bool,
    /// Whether the URL score alone reaches the threshold (or the URL is trusted).
    pub keep_on_url_alone: bool,
    pub threshold: i64,
}

pub fn diagnose(cfg: &CollectorConfig, raw: &str) -> Diagnosis {
    let filter = AdmissionFilter::new(&cfg.allowed_domains, &cfg.filter);
    let scorer = RelevanceScorer::new(&cfg.filter);
    let canonical = canonicalize(raw, &cfg.filter.drop_query_params_prefix);

    let Some(url) = canonical else {
        return Diagnosis {
            input: raw.to_string(),
            canonical: None,
            admitted: false,
            rejection: Some("malformed url".into()),
            url_score: 0,
            url_reason: String::new(),
            trusted: false,
            keep_on_url_alone: false,
            threshold: cfg.filter.score_threshold,
        };
    };

    let rejection = filter.evaluate(&url).err().map(|r| r.to_string());
    let score = scorer.score_url(url.as_str());
    Diagnosis {
        input: raw.to_string(),
        canonical: Some(url.to_string()),
        admitted: rejection.is_none(),
        rejection,
        keep_on_url_alone: score.trusted || score.score >= cfg.filter.score_threshold,
        url_score: score.score,
        url_reason: score.reason,
        trusted: score.trusted,
        threshold: cfg.filter.score_threshold,
    }
}

pub fn run(config_path: &Path, raw: &str, json: bool) -> Result<()> {
    let cfg = CollectorConfig::load(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let d = diagnose(&cfg, raw);

    if json {
        output::print_json(&serde_json::to_value(&d)?);
        return Ok(());
    }

    let s = Styled::new();
    print_diagnosis(&s, &d);
    Ok(())
}

fn print_diagnosis(s: &Styled, d: &Diagnosis) {
    output::print_section(s, &d.input);
    match &d.canonical {
        Some(c) => output::print_check(s.ok_sym(), "canonical", c),
        None => output::print_check(s.fail_sym(), "canonical", &s.red("not a valid absolute url")),
    }
    match &d.rejection {
        None => output::print_check(s.ok_sym(), "admission", &s.green("admitted")),
        Some(reason) => output::print_check(s.fail_sym(), "admission", &s.red(reason)),
    }
    if d.canonical.is_none() {
        return;
    }
    output::print_check(
        if d.trusted { s.ok_sym() } else { " " },
        "trusted",
        if d.trusted { "yes" } else { "no" },
    );
    output::print_check(
        " ",
        "url score",
        &format!("{} {}", d.url_score, s.dim(&format!("({})", d.url_reason))),
    );
    let verdict = if d.keep_on_url_alone {
        s.green("kept on url score alone")
    } else {
        s.yellow(&format!("needs page text to reach {}", d.threshold))
    };
    output::print_check(
        if d.keep_on_url_alone { s.ok_sym() } else { s.warn_sym() },
        "verdict",
        &verdict,
    );
}
