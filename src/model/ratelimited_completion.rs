use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rig::completion::{self, CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use tracing::{debug, debug_span, info_span, Instrument};

/// Provider response passed through a rate-limited completion
#[derive(Debug, Clone)]
pub struct RateLimitResponse<T> {
    response: T,
}

impl<T> RateLimitResponse<T> {
    /// The inner provider's raw response
    pub fn raw(&self) -> &T {
        &self.response
    }
}

/// Completion model that waits on a rate limiter before every request
#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedCompletionModel<M>
where
    M: CompletionModel,
{
    /// Wrap `model` so every completion first waits on `limiter`
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }

    /// Allow at most `requests_per_minute` requests; zero is treated as one
    pub fn per_minute(model: M, requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
        Self::new(model, RateLimiter::direct(quota))
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = RateLimitResponse<M::Response>;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<completion::CompletionResponse<Self::Response>, CompletionError> {
        let started = Instant::now();
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        let waited = started.elapsed();
        if !waited.is_zero() {
            debug!("Waited {:?} for the answering service rate limit", waited);
        }

        let response = self
            .model
            .completion(completion_request)
            .instrument(info_span!("completion"))
            .await?;
        Ok(CompletionResponse {
            choice: response.choice,
            raw_response: RateLimitResponse {
                response: response.raw_response,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock_model::MockCompletionModel;
    use rig::completion::AssistantContent;

    #[tokio::test]
    async fn test_delegates_to_inner_model() {
        let inner = MockCompletionModel::new();
        inner.set_text_response("limited").await;
        let model = RateLimitedCompletionModel::per_minute(inner.clone(), 10);

        let request = model.completion_request("hello").build();
        let response = model.completion(request).await.unwrap();

        assert_eq!(inner.calls(), 1);
        assert_eq!(response.raw_response.raw(), "limited");
        assert!(response
            .choice
            .iter()
            .any(|content| matches!(content, AssistantContent::Text(text) if text.text == "limited")));
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let inner = MockCompletionModel::new();
        inner.set_error("upstream unavailable").await;
        let model = RateLimitedCompletionModel::per_minute(inner, 0);

        let request = model.completion_request("hello").build();
        let result = model.completion(request).await;

        assert!(matches!(result, Err(CompletionError::ProviderError(msg)) if msg == "upstream unavailable"));
    }
}
