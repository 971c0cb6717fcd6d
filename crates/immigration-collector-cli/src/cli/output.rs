//! Terminal output: colors, aligned check lines and the run summary.

use immigration_collector::acquisition::discovery::DiscoverySource;
use immigration_collector::RunStats;
use std::io::IsTerminal;
use std::time::Duration;

/// Color is on for terminals unless `NO_COLOR` is set.
pub fn color_enabled() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Colored string builder.
pub struct Styled {
    use_color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self::with_color(color_enabled())
    }

    pub fn with_color(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn ok_sym(&self) -> &str {
        if self.use_color {
            "\x1b[32m\u{2713}\x1b[0m"
        } else {
            "OK"
        }
    }

    pub fn fail_sym(&self) -> &str {
        if self.use_color {
            "\x1b[31m\u{2717}\x1b[0m"
        } else {
            "!!"
        }
    }

    pub fn warn_sym(&self) -> &str {
        if self.use_color {
            "\x1b[33m\u{26a0}\x1b[0m"
        } else {
            "??"
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    pub fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint(YELLOW, s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

pub fn print_section(s: &Styled, title: &str) {
    eprintln!("  {}", s.bold(title));
}

/// Print a check result line with symbol and label/value.
pub fn print_check(symbol: &str, label: &str, value: &str) {
    eprintln!("    {symbol} {label:<16} {value}");
}

/// Format a duration into human-readable form (e.g., "2m 5s").
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Label/value rows of the run summary, in display order.
pub fn summary_rows(stats: &RunStats) -> Vec<(String, String)> {
    let mut rows = vec![
        ("discovered".to_string(), stats.discovered.to_string()),
        ("enqueued".to_string(), stats.enqueued.to_string()),
        ("filtered".to_string(), stats.filtered.to_string()),
        ("duplicates".to_string(), stats.duplicates.to_string()),
        ("processed".to_string(), stats.processed.to_string()),
        ("fetched".to_string(), stats.fetched.to_string()),
        ("kept".to_string(), stats.kept.to_string()),
        ("rejected".to_string(), stats.rejected.to_string()),
        ("failed".to_string(), stats.failed.to_string()),
        ("feed items".to_string(), stats.feed_items.to_string()),
        ("sitemap urls".to_string(), stats.sitemap_urls.to_string()),
    ];
    for source in [
        DiscoverySource::Seed,
        DiscoverySource::Feed,
        DiscoverySource::Sitemap,
        DiscoverySource::Crawl,
    ] {
        rows.push((
            format!("from {source}"),
            stats.from_source(source).to_string(),
        ));
    }
    rows
}

pub fn print_run_summary(s: &Styled, stats: &RunStats, elapsed: Duration) {
    eprintln!();
    print_section(s, "Run summary");
    for (label, value) in summary_rows(stats) {
        let symbol = match label.as_str() {
            "kept" => s.ok_sym(),
            "failed" if stats.failed > 0 => s.fail_sym(),
            "rejected" | "filtered" => s.warn_sym(),
            _ => " ",
        };
        print_check(symbol, &label, &value);
    }
    eprintln!();
    eprintln!("  {} {}", s.bold("Elapsed"), s.dim(&format_duration(elapsed)));
}

/// Print JSON output to stdout.
pub fn print_json(value: &serde_json::Value) {
    if let Ok(s) = serde_json::to_string_pretty(value) {
        println!("{s}");
    }
}
