//! Main-content text and link extraction from HTML pages.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose subtrees never count as content.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Visible text and outgoing links of a page's main content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    /// Whitespace-collapsed text of the content root.
    pub text: String,
    /// Absolute links in first-seen order, deduplicated.
    pub links: Vec<String>,
}

/// Extracts content using an ordered list of "main content" selectors.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    selectors: Vec<Selector>,
    body: Option<Selector>,
}

impl ContentExtractor {
    /// Build from CSS selectors. Unparseable selectors are skipped; config
    /// validation rejects them before a run starts.
    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Self {
        Self {
            selectors: selectors
                .iter()
                .filter_map(|s| Selector::parse(s.as_ref()).ok())
                .collect(),
            body: Selector::parse("body").ok(),
        }
    }

    /// Extract text and links from `html`, resolving links against `page_url`.
    pub fn extract(&self, page_url: &str, html: &str) -> PageContent {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        let Some(root) = self.content_root(&document) else {
            return PageContent::default();
        };

        let mut text = String::new();
        let mut hrefs = Vec::new();
        walk(root, &mut text, &mut hrefs);

        let mut seen = HashSet::new();
        let links = hrefs
            .into_iter()
            .filter(|href| !href.starts_with("mailto:") && !href.starts_with("tel:"))
            .filter_map(|href| resolve(base.as_ref(), &href))
            .filter(|link| seen.insert(link.clone()))
            .collect();

        PageContent {
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
            links,
        }
    }

    /// First element matched by the first matching selector, else `<body>`,
    /// else the document root. Matches inside non-content elements are ignored.
    fn content_root<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        for selector in &self.selectors {
            if let Some(el) = document.select(selector).find(|el| !in_non_content(*el)) {
                return Some(el);
            }
        }
        if let Some(body) = &self.body {
            if let Some(el) = document.select(body).next() {
                return Some(el);
            }
        }
        Some(document.root_element())
    }
}

fn is_non_content(name: &str) -> bool {
    NON_CONTENT_TAGS.contains(&name)
}

fn in_non_content(el: ElementRef<'_>) -> bool {
    is_non_content(el.value().name())
        || el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| is_non_content(a.value().name()))
}

/// Collect text and `a[href]` values under `el`, skipping non-content subtrees.
fn walk(el: ElementRef<'_>, text: &mut String, hrefs: &mut Vec<String>) {
    if el.value().name() == "a" {
        if let Some(href) = el.value().attr("href") {
            hrefs.push(href.trim().to_string());
        }
    }
    for child in el.children() {
        match child.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if !is_non_content(e.name()) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    walk(child_el, text, hrefs);
                }
            }
            _ => {}
        }
    }
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    Some(resolved.to_string())
}
