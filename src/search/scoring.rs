//! Keyword relevance scoring
//!
//! A page's score for a query is a weighted count of query-token occurrences
//! in its title and content, divided by the number of query tokens. Counting
//! is by substring, so `data` also matches inside `database`.

use serde::Deserialize;

use crate::crawler::PageRecord;

/// Weights and token filtering for relevance scoring
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Query tokens shorter than this many characters are ignored
    pub min_token_length: usize,

    /// Weight of one occurrence in the title
    pub title_weight: f64,

    /// Weight of one occurrence in the content
    pub content_weight: f64,

    /// Strip leading and trailing punctuation from query tokens
    pub trim_punctuation: bool,
}

impl ScoringConfig {
    /// Check that both weights are finite and not negative
    pub fn validate(&self) -> Result<(), String> {
        for (name, weight) in [
            ("title_weight", self.title_weight),
            ("content_weight", self.content_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("scoring.{} must be a non-negative number, got {}", name, weight));
            }
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_token_length: 3,
            title_weight: 3.0,
            content_weight: 1.0,
            trim_punctuation: false,
        }
    }
}

/// Scores pages against a query
///
/// Scoring is a pure function of the query and the record.
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    config: ScoringConfig,
}

impl RelevanceScorer {
    /// Create a scorer with the given configuration
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// The scoring configuration
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Split a query into lower-cased tokens long enough to score
    pub fn tokenize(&self, query: &str) -> Vec<String> {
        query
            .split_whitespace()
            .map(|token| {
                let token = if self.config.trim_punctuation {
                    token.trim_matches(|c: char| !c.is_alphanumeric())
                } else {
                    token
                };
                token.to_lowercase()
            })
            .filter(|token| token.chars().count() >= self.config.min_token_length)
            .collect()
    }

    /// Score a record against a query; `0.0` when the query has no usable tokens
    pub fn score(&self, query: &str, record: &PageRecord) -> f64 {
        self.score_tokens(&self.tokenize(query), record)
    }

    /// Score a record against already tokenized query terms
    ///
    /// The result is never negative, whatever the configured weights.
    pub fn score_tokens(&self, tokens: &[String], record: &PageRecord) -> f64 {
        if tokens.is_empty() {
            return 0.0;
        }

        let title = record.title.to_lowercase();
        let content = record.content.to_lowercase();

        let total: f64 = tokens
            .iter()
            .map(|token| {
                let in_title = title.matches(token.as_str()).count() as f64;
                let in_content = content.matches(token.as_str()).count() as f64;
                self.config.title_weight * in_title + self.config.content_weight * in_content
            })
            .sum();

        (total / tokens.len() as f64).max(0.0)
    }
}
