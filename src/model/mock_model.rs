//! # Mock Completion Model for Testing
//!
//! Provides a `MockCompletionModel` that implements the `CompletionModel` trait
//! for use in tests. It returns a primed text response or error and counts
//! how often it was called, so tests can check that a code path never reached
//! the answering service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use tokio::sync::Mutex;

/// A mock completion model for testing purposes.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    response: Arc<Mutex<Option<Result<String, String>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    /// Creates a new mock model that answers with an empty text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with this text.
    pub async fn set_text_response(&self, text: &str) {
        *self.response.lock().await = Some(Ok(text.to_string()));
    }

    /// Fail every request with a provider error carrying this message.
    pub async fn set_error(&self, message: &str) {
        *self.response.lock().await = Some(Err(message.to_string()));
    }

    /// Number of completion calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.lock().await.clone();
        match response {
            Some(Ok(text)) => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text(&text)),
                raw_response: text,
            }),
            Some(Err(message)) => Err(CompletionError::ProviderError(message)),
            None => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text("")),
                raw_response: String::new(),
            }),
        }
    }
}
