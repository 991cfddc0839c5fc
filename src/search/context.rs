//! Context assembly for the answering service
//!
//! Ranks the content set against a question, keeps the best few pages with a
//! positive score, cuts each to a per-source length and renders them as
//! attributed blocks.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scoring::RelevanceScorer;
use crate::crawler::{truncate_chars, ContentSet, PageRecord};

/// Limits for assembled context
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum number of pages in the context
    pub max_results: usize,

    /// Maximum characters of content taken from each page
    pub max_chars_per_source: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_results: 3,
            max_chars_per_source: 2000,
        }
    }
}

/// A page scored against one question
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    /// Relevance score, never negative
    pub score: f64,

    /// URL of the page
    pub url: &'a str,

    /// The scored page
    pub record: &'a PageRecord,
}

/// One page's contribution to the context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    /// Title of the page
    pub title: String,

    /// URL of the page
    pub url: String,

    /// Relevance score the page was ranked by
    pub score: f64,

    /// Page content, cut to the per-source limit
    pub content: String,
}

impl fmt::Display for ContextEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- PAGE: {} ---", self.title)?;
        writeln!(f, "URL: {}", self.url)?;
        writeln!(f, "Relevance score: {:.2}", self.score)?;
        write!(f, "{}", self.content)
    }
}

/// The ranked, truncated pages assembled for one question
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextBlock {
    /// Entries in rank order, best first
    pub entries: Vec<ContextEntry>,
}

impl ContextBlock {
    /// Whether no page was relevant
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of pages in the context
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Render all entries, in rank order, as a single text blob
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ContextEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Builds context blocks from a content set
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    scorer: RelevanceScorer,
    config: ContextConfig,
}

impl ContextAssembler {
    /// Create an assembler from a scorer and context limits
    pub fn new(scorer: RelevanceScorer, config: ContextConfig) -> Self {
        Self { scorer, config }
    }

    /// The scorer used for ranking
    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    /// Score every page, highest first
    ///
    /// The sort is stable, so equal scores keep the content set's iteration order.
    pub fn rank<'a>(&self, query: &str, content: &'a ContentSet) -> Vec<ScoredCandidate<'a>> {
        let tokens = self.scorer.tokenize(query);
        let mut candidates: Vec<ScoredCandidate<'a>> = content
            .iter()
            .map(|record| ScoredCandidate {
                score: self.scorer.score_tokens(&tokens, record),
                url: record.url.as_str(),
                record,
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }

    /// Assemble context using the configured limits
    pub fn assemble(&self, query: &str, content: &ContentSet) -> ContextBlock {
        self.assemble_with(
            query,
            content,
            self.config.max_results,
            self.config.max_chars_per_source,
        )
    }

    /// Assemble context from the top `max_results` pages with a positive score
    ///
    /// An empty block means nothing in the content set matched the question.
    pub fn assemble_with(
        &self,
        query: &str,
        content: &ContentSet,
        max_results: usize,
        max_per_source_chars: usize,
    ) -> ContextBlock {
        let entries: Vec<ContextEntry> = self
            .rank(query, content)
            .into_iter()
            .filter(|candidate| candidate.score > 0.0)
            .take(max_results)
            .map(|candidate| ContextEntry {
                title: candidate.record.title.clone(),
                url: candidate.url.to_string(),
                score: candidate.score,
                content: truncate_chars(&candidate.record.content, max_per_source_chars),
            })
            .collect();

        debug!(
            "Assembled context from {} of {} pages",
            entries.len(),
            content.len()
        );
        ContextBlock { entries }
    }
}
