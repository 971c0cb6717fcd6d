//! URL canonicalization: the run's deduplication key.

use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

/// A URL after scheme, fragment, query and trailing-slash normalization.
///
/// Always `https`, never carries a fragment, and its path ends in `/` unless
/// the last segment looks like a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Lowercase host, or an empty string for hostless URLs.
    pub fn domain(&self) -> &str {
        self.0.host_str().unwrap_or("")
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for CanonicalUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Canonicalize a raw URL string.
///
/// Returns `None` when `raw` is not an absolute URL or cannot carry an `https`
/// scheme (e.g. `mailto:`). Query parameters whose key starts with any of
/// `drop_query_prefixes` are removed; the rest keep their order.
pub fn canonicalize<S: AsRef<str>>(raw: &str, drop_query_prefixes: &[S]) -> Option<CanonicalUrl> {
    let mut url = Url::parse(raw.trim()).ok()?;

    if url.scheme() != "https" {
        url.set_scheme("https").ok()?;
    }
    url.set_fragment(None);

    strip_query_params(&mut url, drop_query_prefixes);

    let path = url.path();
    let last_segment = path.rsplit('/').next().unwrap_or("");
    if !path.ends_with('/') && !last_segment.contains('.') {
        let with_slash = format!("{path}/");
        url.set_path(&with_slash);
    }

    Some(CanonicalUrl(url))
}

/// Lowercase host of a URL string, or an empty string if it does not parse.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}

fn strip_query_params<S: AsRef<str>>(url: &mut Url, drop_query_prefixes: &[S]) {
    if url.query().is_none() || drop_query_prefixes.is_empty() {
        return;
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let kept: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(key, _)| {
            !drop_query_prefixes
                .iter()
                .any(|p| key.starts_with(p.as_ref()))
        })
        .collect();

    // Re-serialized even when nothing is dropped.
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTM: &[&str] = &["utm_"];

    fn canon(raw: &str) -> String {
        canonicalize(raw, UTM).unwrap().as_str().to_string()
    }

    #[test]
    fn test_collapses_scheme_fragment_and_tracking_variants() {
        let a = canon("http://x.com/a?x=1&utm_source=y#f");
        let b = canon("https://x.com/a?x=1");
        assert_eq!(a, b);
        assert_eq!(a, "https://x.com/a/?x=1");
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "http://Example.COM/Path?b=2&a=1&utm_medium=mail#top",
            "https://example.com/files/report.pdf",
            "https://example.com",
            "https://example.com/a%20b?q=hello+world",
            "http://example.com:8080/x?utm_campaign=z",
        ] {
            let once = canon(raw);
            assert_eq!(canon(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn test_preserves_remaining_param_order() {
        assert_eq!(
            canon("https://x.com/p/?z=3&utm_term=q&a=1&m=2"),
            "https://x.com/p/?z=3&a=1&m=2"
        );
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        assert_eq!(
            canon("https://x.com/p/?UTM_source=a"),
            "https://x.com/p/?UTM_source=a"
        );
    }

    #[test]
    fn test_tracking_param_does_not_change_query_encoding() {
        for query in ["print", "next=/en/a", "q=a%20b", "q=a+b&lang=fr"] {
            let plain = canon(&format!("https://x.com/p/?{query}"));
            let tracked = canon(&format!("https://x.com/p/?{query}&utm_source=y"));
            let leading = canon(&format!("https://x.com/p/?utm_medium=z&{query}"));
            assert_eq!(plain, tracked, "tracking suffix changed {query}");
            assert_eq!(plain, leading, "tracking prefix changed {query}");
        }
        assert_eq!(canon("https://x.com/p/?q=a%20b"), "https://x.com/p/?q=a+b");
        assert_eq!(canon("https://x.com/p/?next=/en/a"), "https://x.com/p/?next=%2Fen%2Fa");
    }

    #[test]
    fn test_empty_drop_list_leaves_query_as_is() {
        let none: [&str; 0] = [];
        let url = canonicalize("https://x.com/p/?next=/en/a&utm_source=y", &none).unwrap();
        assert_eq!(url.as_str(), "https://x.com/p/?next=/en/a&utm_source=y");
    }

    #[test]
    fn test_drops_question_mark_when_all_params_removed() {
        assert_eq!(canon("https://x.com/p?utm_source=a&utm_medium=b"), "https://x.com/p/");
    }

    #[test]
    fn test_trailing_slash_only_for_directory_like_paths() {
        assert_eq!(canon("https://x.com/en/visit"), "https://x.com/en/visit/");
        assert_eq!(canon("https://x.com/en/form.pdf"), "https://x.com/en/form.pdf");
        assert_eq!(canon("https://x.com/v1.2/page"), "https://x.com/v1.2/page/");
        assert_eq!(canon("https://x.com"), "https://x.com/");
    }

    #[test]
    fn test_rejects_relative_and_non_hierarchical() {
        assert!(canonicalize("/en/page", UTM).is_none());
        assert!(canonicalize("not a url", UTM).is_none());
        assert!(canonicalize("mailto:someone@example.com", UTM).is_none());
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://WWW.Canada.ca/en/"), "www.canada.ca");
        assert_eq!(domain_of("garbage"), "");
    }
}
