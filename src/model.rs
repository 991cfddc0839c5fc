//! # Answering Service Client Module
//!
//! This module wraps the external language-model completion endpoint the
//! question-answering pipeline hands its prompt to. The endpoint is opaque:
//! a system prompt, a user prompt and a token budget go in, text comes out.
//!
//! ## Key Components
//!
//! - `Client`: Rate-limited completion model plus the `complete` call
//! - `RateLimitedCompletionModel`: A wrapper that adds rate limiting to any completion model
//! - `CollaboratorError`: Quota, auth, network and other failures, told apart
//!
//! ## Features
//!
//! - Anthropic and Gemini providers through the `rig` framework
//! - API keys read from the environment, never from the config file
//! - Instrumentation with tracing spans for monitoring

use rig::completion::{AssistantContent, CompletionModel};
use rig::providers::{anthropic, gemini};
use tracing::{debug, instrument, warn};

mod error;
#[cfg(test)]
pub mod mock_model;
pub mod ratelimited_completion;

pub use error::CollaboratorError;
pub use ratelimited_completion::RateLimitedCompletionModel;

/// Requests per minute allowed against the answering service
const REQUESTS_PER_MINUTE: u32 = 50;

/// Client for the answering service
#[derive(Debug, Clone)]
pub struct Client<C>
where
    C: CompletionModel,
{
    completion_model: C,
    model_name: String,
}

impl Client<RateLimitedCompletionModel<anthropic::completion::CompletionModel>> {
    /// Create an Anthropic client, reading the key from `ANTHROPIC_API_KEY`
    pub fn new_anthropic_from_env(model: &str) -> Result<Self, CollaboratorError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            CollaboratorError::Auth("ANTHROPIC_API_KEY environment variable is not set".to_string())
        })?;
        Ok(Self::new_anthropic(&api_key, model))
    }

    /// Create an Anthropic client from an API key
    pub fn new_anthropic(api_key: &str, model: &str) -> Self {
        let anthropic_client = anthropic::ClientBuilder::new(api_key).build();
        Self::rate_limited(anthropic_client.completion_model(model), model)
    }
}

impl Client<RateLimitedCompletionModel<gemini::completion::CompletionModel>> {
    /// Create a Gemini client, reading the key from `GEMINI_API_KEY`
    pub fn new_gemini_from_env(model: &str) -> Result<Self, CollaboratorError> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            CollaboratorError::Auth("GEMINI_API_KEY environment variable is not set".to_string())
        })?;
        Ok(Self::new_gemini(&api_key, model))
    }

    /// Create a Gemini client from an API key
    pub fn new_gemini(api_key: &str, model: &str) -> Self {
        let gemini_client = gemini::Client::new(api_key);
        Self::rate_limited(gemini_client.completion_model(model), model)
    }
}

impl<M> Client<RateLimitedCompletionModel<M>>
where
    M: CompletionModel,
{
    fn rate_limited(model: M, model_name: &str) -> Self {
        Self::new(
            RateLimitedCompletionModel::per_minute(model, REQUESTS_PER_MINUTE),
            model_name,
        )
    }
}

impl<C> Client<C>
where
    C: CompletionModel,
{
    /// Wrap an existing completion model
    pub fn new(completion_model: C, model_name: impl Into<String>) -> Self {
        Self {
            completion_model,
            model_name: model_name.into(),
        }
    }

    /// The underlying completion model
    pub fn completion(&self) -> &C {
        &self.completion_model
    }

    /// Name of the model requests are sent to
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Send one prompt and return the text of the reply
    ///
    /// Text parts of the reply are joined; tool calls are ignored.
    #[instrument(skip(self, system_prompt, user_prompt), fields(model = %self.model_name))]
    pub async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        max_tokens: u64,
    ) -> Result<String, CollaboratorError> {
        let mut request = self
            .completion_model
            .completion_request(user_prompt)
            .max_tokens(max_tokens);
        if let Some(system_prompt) = system_prompt {
            request = request.preamble(system_prompt.to_string());
        }

        debug!("Sending prompt of {} characters", user_prompt.len());
        let response = self
            .completion_model
            .completion(request.build())
            .await
            .map_err(|e| {
                warn!("Completion failed: {}", e);
                CollaboratorError::from(e)
            })?;

        let text = response
            .choice
            .iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");
        Ok(text)
    }
}
