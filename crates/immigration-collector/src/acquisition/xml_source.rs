//! Shared plumbing for XML discovery sources (feeds and sitemaps).

use crate::acquisition::http_client::Transport;
use crate::error::DiscoveryError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Length of the body preview attached to diagnostics.
const PREVIEW_CHARS: usize = 220;

/// Selects values by absolute element path, from the text content or an attribute.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PathRule {
    pub path: &'static [&'static str],
    pub attr: Option<&'static str>,
}

impl PathRule {
    pub const fn text(path: &'static [&'static str]) -> Self {
        Self { path, attr: None }
    }

    pub const fn attr(path: &'static [&'static str], attr: &'static str) -> Self {
        Self {
            path,
            attr: Some(attr),
        }
    }
}

/// How one kind of XML source is fetched and recognised.
pub(crate) struct XmlFormat {
    pub accept: &'static str,
    /// Body prefixes that mark XML when the content type does not.
    pub prologues: &'static [&'static str],
    pub rules: &'static [PathRule],
}

/// Fetch an XML source and pull out every value selected by `format.rules`.
pub(crate) async fn read_xml_source(
    transport: &dyn Transport,
    url: &str,
    format: &XmlFormat,
) -> Result<Vec<String>, DiscoveryError> {
    let resp = transport.fetch(url, format.accept).await?;
    if !resp.is_success() {
        return Err(DiscoveryError::Status(resp.status));
    }

    let content_type = resp.content_type.to_lowercase();
    if !content_type.contains("xml") && !looks_like_xml(&resp.body, format.prologues) {
        return Err(DiscoveryError::NotXml {
            content_type,
            preview: body_preview(&resp.body),
        });
    }

    extract_paths(&resp.body, format.rules).map_err(|source| DiscoveryError::Parse {
        source,
        preview: body_preview(&resp.body),
    })
}

pub(crate) fn looks_like_xml(body: &str, prologues: &[&str]) -> bool {
    let trimmed = body.trim_start();
    prologues.iter().any(|p| trimmed.starts_with(p))
}

/// First characters of the body with whitespace runs collapsed.
pub(crate) fn body_preview(body: &str) -> String {
    let head: String = body.trim().chars().take(PREVIEW_CHARS).collect();
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Walk the document once, collecting values whose element path matches a rule.
///
/// Paths are qualified names from the document root, so `atom:link` inside an
/// RSS item does not match `link`.
pub(crate) fn extract_paths(xml: &str, rules: &[PathRule]) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut out = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut text: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                stack.push(qualified_name(e));
                collect_attrs(e, &stack, rules, &mut out);
                if rules.iter().any(|r| r.attr.is_none() && path_eq(&stack, r.path)) {
                    text = Some(String::new());
                }
            }
            Event::Empty(ref e) => {
                stack.push(qualified_name(e));
                collect_attrs(e, &stack, rules, &mut out);
                stack.pop();
            }
            Event::Text(ref e) => {
                if let Some(t) = text.as_mut() {
                    t.push_str(&e.unescape()?);
                }
            }
            Event::CData(ref e) => {
                if let Some(t) = text.as_mut() {
                    t.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(_) => {
                if rules.iter().any(|r| r.attr.is_none() && path_eq(&stack, r.path)) {
                    if let Some(t) = text.take() {
                        let value = t.trim();
                        if !value.is_empty() {
                            out.push(value.to_string());
                        }
                    }
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn collect_attrs(e: &BytesStart<'_>, stack: &[String], rules: &[PathRule], out: &mut Vec<String>) {
    for rule in rules {
        let Some(attr_name) = rule.attr else { continue };
        if !path_eq(stack, rule.path) {
            continue;
        }
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == attr_name.as_bytes() {
                let value = String::from_utf8_lossy(&attr.value).trim().to_string();
                if !value.is_empty() {
                    out.push(value);
                }
            }
        }
    }
}

fn path_eq(stack: &[String], path: &[&str]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &[PathRule] = &[
        PathRule::text(&["root", "item", "link"]),
        PathRule::attr(&["root", "item", "ref"], "href"),
    ];

    #[test]
    fn test_extract_text_and_attributes() {
        let xml = r#"<root>
            <item><link> https://a.ca/1 </link><ref href="https://a.ca/2"/></item>
            <item><link><![CDATA[https://a.ca/3]]></link></item>
            <other><link>https://a.ca/ignored</link></other>
        </root>"#;
        assert_eq!(
            extract_paths(xml, RULES).unwrap(),
            vec!["https://a.ca/1", "https://a.ca/2", "https://a.ca/3"]
        );
    }

    #[test]
    fn test_entities_unescaped() {
        let xml = "<root><item><link>https://a.ca/?a=1&amp;b=2</link></item></root>";
        assert_eq!(extract_paths(xml, RULES).unwrap(), vec!["https://a.ca/?a=1&b=2"]);
    }

    #[test]
    fn test_mismatched_tags_error() {
        assert!(extract_paths("<root><item></root>", RULES).is_err());
    }

    #[test]
    fn test_preview_collapses_and_truncates() {
        let body = format!("  <html>\n\n  <body>{}</body>", "x".repeat(500));
        let preview = body_preview(&body);
        assert!(preview.starts_with("<html> <body>"));
        assert_eq!(preview.chars().count(), 217);
    }

    #[test]
    fn test_looks_like_xml() {
        assert!(looks_like_xml("\n  <?xml version=\"1.0\"?><rss/>", &["<?xml"]));
        assert!(!looks_like_xml("<!doctype html>", &["<?xml", "<rss"]));
    }
}
