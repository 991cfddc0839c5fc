//! # Relevance Search Module
//!
//! This module ranks crawled pages against a question and assembles the
//! winning pages into a bounded, attributed context for the answering
//! service. It is the "retrieval" half of the question-answering pipeline.
//!
//! ## Key Components
//!
//! - `RelevanceScorer`: Weighted keyword-occurrence score of one page for one query
//! - `ScoringConfig`: Token length threshold and title/content weights
//! - `ContextAssembler`: Ranks a content set and builds a `ContextBlock`
//! - `ContextConfig`: How many pages and how many characters per page to keep
//!
//! ## Search Process
//!
//! 1. Tokenize the question on whitespace, lower-case, drop short tokens
//! 2. Score every page: title hits weigh more than content hits
//! 3. Sort by score (stable, so ties keep content-set order)
//! 4. Keep the top pages with a positive score
//! 5. Truncate each page and render it with its title, URL and score
//!
//! Scores measure keyword overlap, not meaning. An empty context block is the
//! normal way of saying "nothing in the documentation matched".

mod context;
mod scoring;

pub use context::{ContextAssembler, ContextBlock, ContextConfig, ContextEntry, ScoredCandidate};
pub use scoring::{RelevanceScorer, ScoringConfig};
