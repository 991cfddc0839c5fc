//! # Question Answering Module
//!
//! This module ties the pipeline together behind one entry point. For each
//! question it loads the content set (from the cache when fresh, otherwise by
//! crawling and re-caching), ranks the pages, assembles a bounded context and
//! hands context plus question to the answering service.
//!
//! ## Key Components
//!
//! - `DocsAssistant`: The `answer` entry point and explicit content refresh
//! - `AnswerConfig`: Model, token budget, site name and contact fallback
//! - `Conversation`: Prior turns, passed in and handed back by the caller
//! - `Answer`: Typed result separating answers from advisories and failures
//!
//! Nothing here is fatal. A failed crawl gives an empty content set, an empty
//! context short-circuits to an advisory without calling the service, and a
//! service failure becomes an apologetic message with a human contact.

use rig::completion::CompletionModel;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::crawler::{ContentSet, ContentSource, CrawlError, CrawlReport};
use crate::model::{Client, CollaboratorError};
use crate::search::{ContextAssembler, ContextBlock, RelevanceScorer};

/// Settings for the answering step
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Model the completion request is sent to
    pub model: String,

    /// Token budget for the reply
    pub max_tokens: u64,

    /// Name of the documentation site, used in prompts and messages
    pub site_name: String,

    /// Who to contact when no answer can be given
    pub contact: String,

    /// Optional system prompt sent with every request
    pub system_prompt: Option<String>,

    /// How many previous turns are included in the prompt
    pub history_turns: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            model: "claude-haiku-4-5".to_string(),
            max_tokens: 10000,
            site_name: "BHF Data Science Centre".to_string(),
            contact: "the documentation maintainers".to_string(),
            system_prompt: None,
            history_turns: 5,
        }
    }
}

/// One question and the reply given to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// What the user asked
    pub question: String,

    /// The reply shown to the user
    pub answer: String,
}

/// Conversation history owned by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Turns in the order they happened
    pub turns: Vec<Turn>,
}

impl Conversation {
    /// Start an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the conversation with one more turn
    pub fn with_turn(mut self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        self.turns.push(Turn {
            question: question.into(),
            answer: answer.into(),
        });
        self
    }

    /// The most recent `n` turns, oldest first
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

/// Outcome of answering one question
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// The answering service replied; its text is passed through unmodified
    Answered(String),

    /// Nothing in the documentation matched the question
    NoRelevantContent,

    /// The answering service failed
    ServiceFailed(CollaboratorError),
}

/// Answers questions about one documentation site
pub struct DocsAssistant<C>
where
    C: CompletionModel,
{
    source: ContentSource,
    assembler: ContextAssembler,
    client: Client<C>,
    config: AnswerConfig,
}

impl<C> DocsAssistant<C>
where
    C: CompletionModel,
{
    /// Build the pipeline from a config and an answering service client
    pub fn new(config: &Config, client: Client<C>) -> Result<Self, CrawlError> {
        let source = ContentSource::new(config.crawler.clone(), config.cache.clone())?;
        let assembler = ContextAssembler::new(
            RelevanceScorer::new(config.scoring.clone()),
            config.context.clone(),
        );

        Ok(Self {
            source,
            assembler,
            client,
            config: config.answer.clone(),
        })
    }

    /// The cache-or-crawl content source
    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    /// The context assembler
    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    /// Content set from the cache if fresh, otherwise crawled and re-cached
    pub async fn load_content(&self) -> ContentSet {
        self.source.load().await
    }

    /// Discard the cache, crawl again and cache the result
    pub async fn refresh(&self) -> CrawlReport {
        self.source.refresh().await
    }

    /// Answer a question with no prior conversation
    pub async fn answer(&self, question: &str) -> String {
        let answer = self.ask(question, &Conversation::new()).await;
        self.render(answer)
    }

    /// Answer a question in the context of a conversation
    ///
    /// Returns the conversation with the new turn appended, along with the reply.
    pub async fn answer_turn(
        &self,
        conversation: Conversation,
        question: &str,
    ) -> (Conversation, String) {
        let answer = self.ask(question, &conversation).await;
        let text = self.render(answer);
        (conversation.with_turn(question, text.clone()), text)
    }

    /// Answer a question, keeping the kind of outcome
    #[instrument(skip(self, conversation), fields(history = conversation.turns.len()))]
    pub async fn ask(&self, question: &str, conversation: &Conversation) -> Answer {
        if question.trim().is_empty() {
            return Answer::NoRelevantContent;
        }

        let content = self.load_content().await;
        let context = self.assembler.assemble(question, &content);
        if context.is_empty() {
            info!("No relevant content among {} pages", content.len());
            return Answer::NoRelevantContent;
        }

        let prompt = self.build_prompt(question, &context, conversation);
        match self
            .client
            .complete(
                self.config.system_prompt.as_deref(),
                &prompt,
                self.config.max_tokens,
            )
            .await
        {
            Ok(text) => Answer::Answered(text),
            Err(e) => {
                warn!("Answering service failed: {}", e);
                Answer::ServiceFailed(e)
            }
        }
    }

    /// Turn an outcome into the text shown to the user
    pub fn render(&self, answer: Answer) -> String {
        match answer {
            Answer::Answered(text) => text,
            Answer::NoRelevantContent => self.no_relevant_content_message(),
            Answer::ServiceFailed(e) => e.user_message(&self.config.contact),
        }
    }

    /// Advisory shown when the documentation has nothing on the question
    pub fn no_relevant_content_message(&self) -> String {
        format!(
            "I couldn't find enough information in the {} documentation to answer that. \
             Try rephrasing your question with more specific terms, or contact {}.",
            self.config.site_name, self.config.contact
        )
    }

    /// Prompt sent to the answering service
    pub fn build_prompt(
        &self,
        question: &str,
        context: &ContextBlock,
        conversation: &Conversation,
    ) -> String {
        let mut prompt = format!(
            "Based on the {site} documentation below, please answer the user's question.\n\n\
             When providing your answer, please cite which specific page(s) you got the \
             information from by mentioning the page title(s).\n\n\
             Documentation:\n{context}\n\n",
            site = self.config.site_name,
            context = context.render(),
        );

        let history = conversation.recent(self.config.history_turns);
        if !history.is_empty() {
            prompt.push_str("Previous conversation:\n");
            for turn in history {
                prompt.push_str(&format!("Q: {}\nA: {}\n", turn.question, turn.answer));
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "Question: {}\n\n\
             Please provide a helpful answer based on the documentation and clearly state \
             which page(s) you found the information on. If the information isn't available \
             in the documentation, say so clearly.",
            question
        ));
        prompt
    }
}
