//! Shared error types for the services crate.

use thiserror::Error;

/// Errors emitted by a `TextGenerator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("generative-text service returned an empty response")]
    EmptyResponse,
    #[error("generative-text request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Failure of a tutor chat request.
///
/// Unlike explanations, chat failures reach the caller, which decides what the
/// student sees.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatServiceError {
    #[error("tutor chat failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Errors emitted by `TutorConversation`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TutorError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a reply is already pending")]
    Busy,
    #[error("no reply is pending")]
    NotPending,
}
