//! Admission filter: decides whether a canonical URL may enter the frontier.
//!
//! The stateless predicates live here. Run-scoped deduplication is owned by
//! [`Frontier`](super::queue::Frontier), which checks and inserts in one step.

use crate::config::FilterConfig;
use crate::frontier::canonical::CanonicalUrl;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Why a URL was kept out of the frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The raw string did not canonicalize.
    Malformed,
    DomainNotAllowed(String),
    /// Path outside the domain's language section.
    Language { domain: String, prefix: String },
    /// Path outside every configured scope prefix of the domain.
    OutOfScope(String),
    /// Matched the extension or substring blocklist; the reason names the rule.
    Blocked(String),
    /// Already admitted earlier in this run.
    Duplicate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Malformed => write!(f, "malformed url"),
            Rejection::DomainNotAllowed(d) => write!(f, "domain not allowed: {d}"),
            Rejection::Language { domain, prefix } => {
                write!(f, "outside {prefix} language section of {domain}")
            }
            Rejection::OutOfScope(d) => write!(f, "outside configured path scope of {d}"),
            Rejection::Blocked(reason) => f.write_str(reason),
            Rejection::Duplicate => write!(f, "already admitted this run"),
        }
    }
}

/// The stateless admission predicates, evaluated cheapest first.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    allowed_domains: HashSet<String>,
    english_only: bool,
    language_prefixes: BTreeMap<String, String>,
    path_scopes: BTreeMap<String, Vec<String>>,
    drop_extensions: Vec<String>,
    drop_path_contains: Vec<String>,
}

impl AdmissionFilter {
    pub fn new(allowed_domains: &[String], filter: &FilterConfig) -> Self {
        Self {
            allowed_domains: allowed_domains.iter().cloned().collect(),
            english_only: filter.english_only,
            language_prefixes: filter.language_prefixes.clone(),
            path_scopes: filter.path_scopes.clone(),
            drop_extensions: filter
                .drop_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            drop_path_contains: filter
                .drop_path_contains
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// Run predicates 1–4 (domain, language, scope, blocklist).
    pub fn evaluate(&self, url: &CanonicalUrl) -> Result<(), Rejection> {
        let domain = url.domain();

        if !self.allowed_domains.contains(domain) {
            return Err(Rejection::DomainNotAllowed(domain.to_string()));
        }
        self.check_language(domain, url.path())?;
        self.check_scope(domain, url.path())?;
        match self.blocked_reason(url.as_str()) {
            Some(reason) => Err(Rejection::Blocked(reason)),
            None => Ok(()),
        }
    }

    fn check_language(&self, domain: &str, path: &str) -> Result<(), Rejection> {
        if !self.english_only {
            return Ok(());
        }
        match self.language_prefixes.get(domain) {
            Some(prefix) if !path.to_lowercase().starts_with(prefix.as_str()) => {
                Err(Rejection::Language {
                    domain: domain.to_string(),
                    prefix: prefix.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_scope(&self, domain: &str, path: &str) -> Result<(), Rejection> {
        match self.path_scopes.get(domain) {
            Some(prefixes) if !prefixes.is_empty() => {
                if prefixes.iter().any(|p| path.starts_with(p.as_str())) {
                    Ok(())
                } else {
                    Err(Rejection::OutOfScope(domain.to_string()))
                }
            }
            _ => Ok(()),
        }
    }

    fn blocked_reason(&self, url: &str) -> Option<String> {
        let lower = url.to_lowercase();
        if let Some(ext) = self.drop_extensions.iter().find(|e| lower.ends_with(e.as_str())) {
            return Some(format!("dropped extension: {ext}"));
        }
        self.drop_path_contains
            .iter()
            .find(|p| lower.contains(p.as_str()))
            .map(|p| format!("dropped path: {p}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::canonical::canonicalize;

    fn filter() -> AdmissionFilter {
        let mut cfg = crate::config::tests::minimal_config().filter;
        cfg.english_only = true;
        cfg.language_prefixes
            .insert("www.canada.ca".into(), "/en/".into());
        cfg.path_scopes.insert(
            "www.canada.ca".into(),
            vec!["/en/immigration-refugees-citizenship/".into()],
        );
        cfg.path_scopes.insert("example.gc.ca".into(), vec![]);
        cfg.drop_extensions = vec![".JPG".into(), ".zip".into()];
        cfg.drop_path_contains = vec!["/search".into(), "/fr/".into()];
        AdmissionFilter::new(
            &[
                "www.canada.ca".to_string(),
                "example.gc.ca".to_string(),
                "laws-lois.justice.gc.ca".to_string(),
            ],
            &cfg,
        )
    }

    fn eval(raw: &str) -> Result<(), Rejection> {
        let url = canonicalize::<&str>(raw, &[]).unwrap();
        filter().evaluate(&url)
    }

    #[test]
    fn test_domain_allowlist() {
        assert!(eval("https://example.gc.ca/en/page").is_ok());
        assert_eq!(
            eval("https://evil.example.com/en/page"),
            Err(Rejection::DomainNotAllowed("evil.example.com".into()))
        );
    }

    #[test]
    fn test_language_rule_only_for_designated_domain() {
        assert!(matches!(
            eval("https://www.canada.ca/fr/immigration-refugees-citizenship/"),
            Err(Rejection::Language { .. })
        ));
        assert!(eval("https://laws-lois.justice.gc.ca/eng/acts/I-2.5/").is_ok());
    }

    #[test]
    fn test_path_scope() {
        assert!(eval("https://www.canada.ca/en/immigration-refugees-citizenship/services/").is_ok());
        assert_eq!(
            eval("https://www.canada.ca/en/revenue-agency/"),
            Err(Rejection::OutOfScope("www.canada.ca".into()))
        );
        // Scope prefixes are case-sensitive.
        assert_eq!(
            eval("https://www.canada.ca/EN/immigration-refugees-citizenship/"),
            Err(Rejection::OutOfScope("www.canada.ca".into()))
        );
        // Empty scope list disables the rule.
        assert!(eval("https://example.gc.ca/anything/").is_ok());
    }

    #[test]
    fn test_blocklist_reasons() {
        assert_eq!(
            eval("https://example.gc.ca/img/photo.jpg"),
            Err(Rejection::Blocked("dropped extension: .jpg".into()))
        );
        assert_eq!(
            eval("https://example.gc.ca/search?q=visa"),
            Err(Rejection::Blocked("dropped path: /search".into()))
        );
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let url = canonicalize::<&str>("https://www.canada.ca/en/immigration-refugees-citizenship/", &[])
            .unwrap();
        let f = filter();
        assert_eq!(f.evaluate(&url), f.evaluate(&url));
        let url = canonicalize::<&str>("https://other.ca/", &[]).unwrap();
        assert_eq!(f.evaluate(&url), f.evaluate(&url));
    }

    #[test]
    fn test_language_rule_disabled_without_english_only() {
        let mut cfg = crate::config::tests::minimal_config().filter;
        cfg.language_prefixes
            .insert("www.canada.ca".into(), "/en/".into());
        let f = AdmissionFilter::new(&["www.canada.ca".to_string()], &cfg);
        let url = canonicalize::<&str>("https://www.canada.ca/fr/page", &[]).unwrap();
        assert!(f.evaluate(&url).is_ok());
    }
}
