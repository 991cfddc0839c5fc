//! Configuration file support
//!
//! All settings live in one TOML file with a section per component. Every
//! field has a default, so an empty file (or no file) is a valid config.
//!
//! ```toml
//! provider = "anthropic"
//!
//! [crawler]
//! base_url = "https://bhfdsc.github.io/documentation/"
//! known_paths = ["docs/", "faq/"]
//! request_delay_ms = 500
//!
//! [cache]
//! path = ".docs-qa/cache.json"
//! ttl_secs = 3600
//!
//! [context]
//! max_results = 3
//! max_chars_per_source = 2000
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::assistant::AnswerConfig;
use crate::crawler::{CacheConfig, CrawlerConfig};
use crate::error::{Error, Result};
use crate::search::{ContextConfig, ScoringConfig};

/// Which completion provider answers questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Anthropic models, keyed by `ANTHROPIC_API_KEY`
    #[default]
    Anthropic,

    /// Gemini models, keyed by `GEMINI_API_KEY`
    Gemini,
}

/// Complete configuration of the question-answering pipeline
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Answering service provider
    pub provider: Provider,

    /// Which pages to fetch and how
    pub crawler: CrawlerConfig,

    /// Where the content set is cached and for how long
    pub cache: CacheConfig,

    /// Relevance scoring weights
    pub scoring: ScoringConfig,

    /// How many pages go into the context, and how much of each
    pub context: ContextConfig,

    /// Model, token budget and user-facing messages
    pub answer: AnswerConfig,
}

impl Config {
    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()
    }

    /// Read a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        self.scoring.validate().map_err(Error::Config)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.provider, Provider::Anthropic);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.context.max_results, 3);
        assert_eq!(config.scoring.min_token_length, 3);
        assert_eq!(config.answer.max_tokens, 10000);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            provider = "gemini"

            [crawler]
            base_url = "https://docs.example.com/"
            known_paths = ["a/", "b/"]

            [scoring]
            title_weight = 5.0

            [answer]
            model = "gemini-2.0-flash"
            contact = "help@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.crawler.known_paths.len(), 2);
        assert_eq!(config.crawler.request_delay_ms, 500);
        assert_eq!(config.scoring.title_weight, 5.0);
        assert_eq!(config.scoring.content_weight, 1.0);
        assert_eq!(config.answer.model, "gemini-2.0-flash");
        assert_eq!(config.answer.contact, "help@example.com");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = Config::from_toml_str("provider = [");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = Config::from_toml_str("provider = \"openai\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_negative_scoring_weight_is_rejected() {
        let result = Config::from_toml_str("[scoring]\ntitle_weight = -3.0\n");
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("title_weight")));
    }
}
