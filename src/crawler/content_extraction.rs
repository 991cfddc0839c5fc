//! Content extraction functionality for the crawler module

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::crawler::CrawlerConfig;

/// Elements that start a new block of text
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th", "article",
    "section", "main", "blockquote", "pre", "figcaption", "dt", "dd", "table", "ul", "ol",
];

/// Title and cleaned text of one HTML document
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// Text of the `<title>` element, or a name derived from the URL
    pub title: String,

    /// Cleaned text of the main content region
    pub content: String,
}

fn artifact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Empty markdown-style links and images, and bare empty brackets
        Regex::new(r"!?\[\s*\]\([^)]*\)|\[\s*\]").expect("artifact pattern is valid")
    })
}

/// Normalize extracted text
///
/// Empty link and image placeholders are removed, whitespace runs (newlines
/// included) collapse to single spaces and the result is trimmed. Applying
/// this twice gives the same result as applying it once.
pub fn clean_text(text: &str) -> String {
    let pattern = artifact_pattern();
    let mut current = text.to_string();

    // Removing one placeholder can expose another, e.g. "[[]]"
    loop {
        let next = pattern.replace_all(&current, "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }

    current.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive a page name from the last non-empty path segment of a URL
pub fn fallback_title(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };

    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| segment.to_string())
        .or_else(|| parsed.host_str().map(|host| host.to_string()))
        .unwrap_or_else(|| url.to_string())
}

/// Extract the title and main text of an HTML document
///
/// Content regions are tried in the configured selector order and the first
/// one with text wins. Without a match the whole `<body>` is used, and
/// without a body the whole document. Malformed HTML never fails: the parser
/// recovers and extraction works on whatever tree it produced.
pub fn extract_page(html: &str, url: &str, config: &CrawlerConfig) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = select_first_text(&document, "title", &config.remove_elements)
        .unwrap_or_else(|| fallback_title(url));

    let content = select_content(&document, config).unwrap_or_else(|| {
        debug!("No content region or body in {}, using whole document", url);
        clean_text(&collect_text(&document.root_element(), &config.remove_elements))
    });

    ExtractedPage { title, content }
}

/// Resolve the `<a href>` links of a document against `base`
///
/// Only links that start with the base URL are returned, without fragments,
/// in document order and without duplicates.
pub fn extract_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links: Vec<String> = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        resolved.set_fragment(None);
        let resolved = resolved.to_string();
        if resolved.starts_with(base.as_str()) && !links.contains(&resolved) {
            links.push(resolved);
        }
    }
    links
}

fn select_content(document: &Html, config: &CrawlerConfig) -> Option<String> {
    for selector_str in &config.content_selectors {
        match Selector::parse(selector_str) {
            Ok(selector) => {
                for element in document.select(&selector) {
                    let text = clean_text(&collect_text(&element, &config.remove_elements));
                    if !text.is_empty() {
                        return Some(text);
                    }
                }
            }
            Err(e) => {
                warn!("Failed to parse selector '{}': {:?}", selector_str, e);
            }
        }
    }

    let body_selector = Selector::parse("body").ok()?;
    document
        .select(&body_selector)
        .next()
        .map(|body| clean_text(&collect_text(&body, &config.remove_elements)))
}

fn select_first_text(document: &Html, selector: &str, skip: &[String]) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(|element| clean_text(&collect_text(&element, skip)))
        .find(|text| !text.is_empty())
}

fn collect_text(element: &ElementRef<'_>, skip: &[String]) -> String {
    let mut buf = String::new();
    push_text(element, skip, &mut buf);
    buf
}

fn push_text(element: &ElementRef<'_>, skip: &[String], buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let tag = el.name();
                if skip.iter().any(|s| s.eq_ignore_ascii_case(tag)) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&tag);
                if block {
                    buf.push(' ');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    push_text(&child_ref, skip, buf);
                }
                if block {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }
}
