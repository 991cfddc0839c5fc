//! # docs-qa - Question answering over a documentation website
//!
//! This crate answers natural-language questions about a small documentation
//! site. It crawls and caches the site's text, ranks the cached pages by
//! keyword relevance to a question, and passes a bounded, attributed context
//! to a language model that writes the answer.
//!
//! ## Features
//!
//! - Bounded crawl of a base URL plus a known list of paths, one page at a time
//! - HTML text extraction with content-region selection and whitespace cleanup
//! - JSON content cache with a time-to-live, treated as absent when stale or corrupt
//! - Weighted keyword scoring with title hits counting more than body hits
//! - Context assembly with top-K selection and per-source truncation
//! - Anthropic and Gemini answering services through `rig`, rate limited
//! - Every failure degrades to a smaller result or a user-facing message
//!
//! ## Example
//!
//! ```rust,no_run
//! use docs_qa::config::Config;
//! use docs_qa::model::Client;
//! use docs_qa::DocsAssistant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = Client::new_anthropic_from_env(&config.answer.model)?;
//!     let assistant = DocsAssistant::new(&config, client)?;
//!
//!     let reply = assistant.answer("How do I access CVD-COVID-UK data?").await;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

mod error;

pub mod assistant;
pub mod config;
pub mod crawler;
pub mod model;
pub mod search;

pub use assistant::{Answer, Conversation, DocsAssistant};
pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
