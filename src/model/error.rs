//! Error types for the answering service

use rig::completion::CompletionError;
use thiserror::Error;

use crate::error::Error as CrateError;

/// Failure of a call to the answering service
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CollaboratorError {
    /// Usage quota or rate limit exhausted
    #[error("quota or rate limit exceeded: {0}")]
    Quota(String),

    /// Missing or rejected credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// Any other failure
    #[error("{0}")]
    Other(String),
}

impl CollaboratorError {
    /// Classify a failure from its message
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if ["429", "rate limit", "rate_limit", "quota", "credit balance"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            CollaboratorError::Quota(message)
        } else if ["401", "403", "auth", "api key", "api_key", "permission"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            CollaboratorError::Auth(message)
        } else if ["timed out", "timeout", "connection", "dns", "network"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            CollaboratorError::Network(message)
        } else {
            CollaboratorError::Other(message)
        }
    }

    /// Short description of the failure kind for users
    pub fn kind(&self) -> &'static str {
        match self {
            CollaboratorError::Quota(_) => "the answering service's usage limit has been reached",
            CollaboratorError::Auth(_) => "the answering service rejected our credentials",
            CollaboratorError::Network(_) => "the answering service could not be reached",
            CollaboratorError::Other(_) => "the answering service returned an error",
        }
    }

    /// Apologetic message naming the failure and where to get help instead
    pub fn user_message(&self, contact: &str) -> String {
        format!(
            "Sorry, I couldn't get an answer because {} ({}). Please try again later, or contact {} for help.",
            self.kind(),
            self,
            contact
        )
    }
}

impl From<CompletionError> for CollaboratorError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::HttpError(e) => match e.status().map(|s| s.as_u16()) {
                Some(429) => CollaboratorError::Quota(e.to_string()),
                Some(401) | Some(403) => CollaboratorError::Auth(e.to_string()),
                Some(_) => CollaboratorError::classify(e.to_string()),
                None => CollaboratorError::Network(e.to_string()),
            },
            other => CollaboratorError::classify(other.to_string()),
        }
    }
}

impl From<CollaboratorError> for CrateError {
    fn from(err: CollaboratorError) -> Self {
        CrateError::Completion(err.to_string())
    }
}
