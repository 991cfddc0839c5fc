//! # Documentation Crawler Module
//!
//! This module fetches the pages of a single documentation site, extracts
//! their text and keeps the substantial ones as the content set the rest of
//! the pipeline ranks against a question.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: Base URL, known paths, timeouts, politeness delay and length bounds
//! - `SiteCrawler`: Discovers candidate URLs and fetches them one at a time
//! - `PageRecord`: One fetched page (or a failed fetch, flagged with `error`)
//! - `ContentSet`: The filtered pages of one crawl cycle, keyed by URL
//! - `ContentCache`: JSON persistence of a content set with a time-to-live
//! - `ContentSource`: Serves the cached content set, crawling again when it is stale
//!
//! ## Features
//!
//! - Bounded URL discovery from a fixed path list, with optional one-level link discovery
//! - Per-page failure isolation: a bad page is logged and skipped, never fatal
//! - Typed crawl outcomes so callers can tell errors from length-filtered pages
//! - Fixed delay between consecutive requests

mod config;
mod content_extraction;
mod error;
mod fetch;
mod site_crawler;
mod source;
pub mod storage;

pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use content_extraction::{clean_text, extract_page, fallback_title, ExtractedPage};
pub use error::CrawlError;
pub use fetch::PageFetcher;
pub use site_crawler::{CrawlReport, SiteCrawler};
pub use source::ContentSource;
pub use storage::{CacheConfig, CacheError, ContentCache};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker appended to content that was cut to a length bound
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// A single crawled page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL the page was fetched from
    pub url: String,

    /// Title of the page
    pub title: String,

    /// Cleaned, whitespace-normalized text of the page
    pub content: String,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,

    /// Whether the fetch failed; `content` then describes the failure
    #[serde(default)]
    pub error: bool,
}

impl PageRecord {
    /// Record for a failed fetch, carrying a description of the failure
    pub fn failed(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        let url = url.into();
        Self {
            title: fallback_title(&url),
            content: format!("Failed to fetch page: {}", reason),
            url,
            fetched_at: Utc::now(),
            error: true,
        }
    }

    /// Length of the content in characters
    pub fn content_chars(&self) -> usize {
        self.content.chars().count()
    }
}

/// Why a crawled page did or did not make it into the content set
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlOutcome {
    /// The page is kept
    Accepted(PageRecord),

    /// The fetch failed; the record carries the failure description
    Failed(PageRecord),

    /// The page was fetched but its content is below the minimum length
    TooShort(PageRecord),
}

impl CrawlOutcome {
    /// Classify a record against the minimum content length
    pub fn classify(record: PageRecord, min_content_length: usize) -> Self {
        if record.error {
            CrawlOutcome::Failed(record)
        } else if record.content_chars() < min_content_length {
            CrawlOutcome::TooShort(record)
        } else {
            CrawlOutcome::Accepted(record)
        }
    }

    /// The record behind this outcome
    pub fn record(&self) -> &PageRecord {
        match self {
            CrawlOutcome::Accepted(record)
            | CrawlOutcome::Failed(record)
            | CrawlOutcome::TooShort(record) => record,
        }
    }

    /// Whether the page is kept
    pub fn is_accepted(&self) -> bool {
        matches!(self, CrawlOutcome::Accepted(_))
    }
}

/// The pages of one crawl cycle, keyed by URL
///
/// Iteration follows URL order, so ranking ties resolve the same way on every
/// run over the same content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSet {
    pages: BTreeMap<String, PageRecord>,
}

impl ContentSet {
    /// Create an empty content set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record with the same URL
    pub fn insert(&mut self, record: PageRecord) {
        self.pages.insert(record.url.clone(), record);
    }

    /// Look up a record by URL
    pub fn get(&self, url: &str) -> Option<&PageRecord> {
        self.pages.get(url)
    }

    /// Iterate over the records
    pub fn iter(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.values()
    }

    /// Number of pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the set has no pages
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total content length across all pages, in characters
    pub fn total_chars(&self) -> usize {
        self.pages.values().map(PageRecord::content_chars).sum()
    }
}

impl FromIterator<PageRecord> for ContentSet {
    fn from_iter<I: IntoIterator<Item = PageRecord>>(iter: I) -> Self {
        let mut set = ContentSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Cut `text` to at most `max_chars` characters, appending the truncation marker if cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
