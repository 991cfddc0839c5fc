//! # Crawler Configuration Module
//!
//! This module provides configuration options for the documentation crawler:
//! which URLs to fetch, how politely to fetch them, and how page text is
//! selected and bounded. It uses a builder pattern for flexible configuration.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration
//!
//! ## Features
//!
//! - Defaults suitable for polite crawling of a small documentation site
//! - A bounded, explicit list of known paths resolved against one base URL
//! - Content region selection via CSS selectors, in priority order
//! - Length bounds that keep near-empty pages out and huge pages cut

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the crawler
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Base URL of the documentation site
    pub base_url: String,

    /// Paths resolved against the base URL to form the candidate set
    pub known_paths: Vec<String>,

    /// Timeout for a single page fetch, in seconds
    pub request_timeout_secs: u64,

    /// Delay between consecutive fetches, in milliseconds
    pub request_delay_ms: u64,

    /// Pages with less content than this many characters are dropped
    pub min_content_length: usize,

    /// Content longer than this many characters is truncated
    pub max_content_length: usize,

    /// User agent to use for requests
    pub user_agent: String,

    /// CSS selectors for the main content region, tried in order
    pub content_selectors: Vec<String>,

    /// Elements whose text is never extracted
    pub remove_elements: Vec<String>,

    /// Also follow links found on the base page (one level, same site prefix)
    pub discover_links: bool,

    /// Upper bound on the number of candidate URLs
    pub max_pages: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bhfdsc.github.io/documentation/".to_string(),
            known_paths: Vec::new(),
            request_timeout_secs: 10,
            request_delay_ms: 500,
            min_content_length: 100,
            max_content_length: 50_000,
            user_agent: format!("docs-qa/{}", env!("CARGO_PKG_VERSION")),
            content_selectors: vec![
                "main".to_string(),
                "article".to_string(),
                "[role=\"main\"]".to_string(),
                ".content".to_string(),
                "#content".to_string(),
                ".main-content".to_string(),
            ],
            remove_elements: vec![
                "script".to_string(),
                "style".to_string(),
                "noscript".to_string(),
            ],
            discover_links: false,
            max_pages: 50,
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the known relative paths
    pub fn known_paths(mut self, known_paths: Vec<String>) -> Self {
        self.config.known_paths = known_paths;
        self
    }

    /// Set the per-request timeout in seconds
    pub fn request_timeout_secs(mut self, request_timeout_secs: u64) -> Self {
        self.config.request_timeout_secs = request_timeout_secs;
        self
    }

    /// Set the delay in milliseconds between consecutive requests
    pub fn request_delay_ms(mut self, request_delay_ms: u64) -> Self {
        self.config.request_delay_ms = request_delay_ms;
        self
    }

    /// Set the minimum content length in characters
    pub fn min_content_length(mut self, min_content_length: usize) -> Self {
        self.config.min_content_length = min_content_length;
        self
    }

    /// Set the maximum content length in characters
    pub fn max_content_length(mut self, max_content_length: usize) -> Self {
        self.config.max_content_length = max_content_length;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the CSS selectors for the content region
    pub fn content_selectors(mut self, content_selectors: Vec<String>) -> Self {
        self.config.content_selectors = content_selectors;
        self
    }

    /// Set the elements whose text is dropped
    pub fn remove_elements(mut self, remove_elements: Vec<String>) -> Self {
        self.config.remove_elements = remove_elements;
        self
    }

    /// Enable or disable one-level link discovery from the base page
    pub fn discover_links(mut self, discover_links: bool) -> Self {
        self.config.discover_links = discover_links;
        self
    }

    /// Set the maximum number of candidate URLs
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the request delay as a Duration
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
