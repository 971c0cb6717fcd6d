//! Relevance scoring for URLs and extracted page text.

use crate::config::{FilterConfig, ScoreRules};
use crate::frontier::canonical::domain_of;
use serde::Serialize;

/// Bonus for a URL inside the IRPA/IRPR statute or regulation sections.
pub const LEGAL_SOURCE_BONUS: i64 = 5;
/// Bonus for a Canada Gazette page referencing a regulation.
pub const GAZETTE_BONUS: i64 = 5;
/// Bonus for at least one immigration term in the URL or the page text.
pub const TERM_MATCH_BONUS: i64 = 2;

/// Class of an authoritative source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrustClass {
    /// Justice Laws statute/regulation pages and their PDF mirrors.
    LegalSource,
    /// Canada Gazette pages referencing a regulation.
    Gazette,
    /// Operator-configured substring (`always_keep_contains`); trust only, no bonus.
    Configured,
}

/// One row of the trust table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedPattern {
    /// Host the URL must be on (exact or subdomain), if any.
    pub domain: Option<String>,
    /// Lowercase substring the URL must contain.
    pub needle: String,
    pub class: TrustClass,
}

impl TrustedPattern {
    fn new(domain: Option<&str>, needle: &str, class: TrustClass) -> Self {
        Self {
            domain: domain.map(str::to_string),
            needle: needle.to_lowercase(),
            class,
        }
    }

    fn matches(&self, lower_url: &str, domain: &str) -> bool {
        let on_domain = match &self.domain {
            Some(d) => domain == d || domain.ends_with(&format!(".{d}")),
            None => true,
        };
        on_domain && lower_url.contains(&self.needle)
    }
}

/// Built-in canonical legal sources for Canadian immigration law.
pub fn builtin_trusted_patterns() -> Vec<TrustedPattern> {
    use TrustClass::*;
    vec![
        TrustedPattern::new(None, "laws-lois.justice.gc.ca/eng/acts/i-2.5", LegalSource),
        TrustedPattern::new(
            None,
            "laws-lois.justice.gc.ca/eng/regulations/sor-2002-227",
            LegalSource,
        ),
        TrustedPattern::new(None, "laws.justice.gc.ca/pdf/i-2.5", LegalSource),
        TrustedPattern::new(None, "laws-lois.justice.gc.ca/pdf/sor-2002-227", LegalSource),
        TrustedPattern::new(Some("gazette.gc.ca"), "sor-", Gazette),
        TrustedPattern::new(Some("gazette.gc.ca"), "si-", Gazette),
        TrustedPattern::new(Some("gazette.gc.ca"), "regulations", Gazette),
    ]
}

/// A score with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub score: i64,
    pub reason: String,
    pub trusted: bool,
}

impl ScoreResult {
    fn untrusted(score: i64, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
            trusted: false,
        }
    }

    /// Placeholder text score for responses that are not HTML.
    pub fn no_text_scoring() -> Self {
        Self::untrusted(0, "no text scoring")
    }
}

/// Final keep/reject decision for one fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub url: ScoreResult,
    pub text: ScoreResult,
    pub total: i64,
    pub keep: bool,
}

impl Decision {
    /// Reason string recorded in the store.
    pub fn reason(&self) -> String {
        let mut reason = format!("url: {}; text: {}", self.url.reason, self.text.reason);
        if self.url.trusted {
            reason.push_str("; trusted");
        }
        reason
    }
}

/// Computes URL and text scores from the configured rules.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    trusted: Vec<TrustedPattern>,
    terms: Vec<String>,
    rules: ScoreRules,
    threshold: i64,
}

impl RelevanceScorer {
    pub fn new(filter: &FilterConfig) -> Self {
        let mut trusted = builtin_trusted_patterns();
        trusted.extend(
            filter
                .always_keep_contains
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| TrustedPattern::new(None, s, TrustClass::Configured)),
        );
        Self {
            trusted,
            terms: filter
                .immigration_terms
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            rules: filter.score_rules.clone(),
            threshold: filter.score_threshold,
        }
    }

    /// Trust classes matched by a URL, in table order.
    fn trust_classes(&self, lower_url: &str, domain: &str) -> Vec<TrustClass> {
        self.trusted
            .iter()
            .filter(|p| p.matches(lower_url, domain))
            .map(|p| p.class)
            .collect()
    }

    pub fn is_trusted(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        !self.trust_classes(&lower, &domain_of(url)).is_empty()
    }

    /// Score a URL from its text alone.
    pub fn score_url(&self, url: &str) -> ScoreResult {
        let domain = domain_of(url);
        let lower = url.to_lowercase();
        let classes = self.trust_classes(&lower, &domain);
        let mut reasons = Vec::new();

        let mut score = self.rules.domain_bonus.get(&domain).copied().unwrap_or(0);

        if classes.contains(&TrustClass::LegalSource) {
            score += LEGAL_SOURCE_BONUS;
            reasons.push(format!("+{LEGAL_SOURCE_BONUS} trusted IRPA/IRPR"));
        }
        if classes.contains(&TrustClass::Gazette) {
            score += GAZETTE_BONUS;
            reasons.push(format!("+{GAZETTE_BONUS} trusted Gazette reg"));
        }
        if self.terms.iter().any(|t| lower.contains(t.as_str())) {
            score += TERM_MATCH_BONUS;
            reasons.push(format!("+{TERM_MATCH_BONUS} url term match"));
        }

        // Cumulative, and independent of the term bonus above.
        for (needle, weight) in &self.rules.contains_bonus {
            if lower.contains(&needle.to_lowercase()) {
                score += weight;
            }
        }
        for (needle, weight) in &self.rules.contains_penalty {
            if lower.contains(&needle.to_lowercase()) {
                score -= weight;
            }
        }

        let reason = if reasons.is_empty() {
            "url score".to_string()
        } else {
            reasons.join(", ")
        };
        ScoreResult {
            score,
            reason,
            trusted: !classes.is_empty(),
        }
    }

    /// Score extracted page text.
    pub fn score_text(&self, text: &str) -> ScoreResult {
        if self.terms.is_empty() {
            return ScoreResult::untrusted(0, "no terms configured");
        }
        let lower = text.to_lowercase();
        if self.terms.iter().any(|t| lower.contains(t.as_str())) {
            ScoreResult::untrusted(TERM_MATCH_BONUS, format!("+{TERM_MATCH_BONUS} page text term match"))
        } else {
            ScoreResult::untrusted(0, "no page text match")
        }
    }

    /// Combine both scores into a keep decision.
    pub fn decide(&self, url: ScoreResult, text: ScoreResult) -> Decision {
        let total = url.score + text.score;
        let keep = url.trusted || total >= self.threshold;
        Decision {
            url,
            text,
            total,
            keep,
        }
    }
}
