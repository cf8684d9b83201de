use thiserror::Error;

use crate::model::{BankError, QuestionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),
}

/// An assessment operation was invoked outside its precondition.
///
/// The session is left exactly as it was when one of these is returned, so
/// callers driving the engine from a UI can ignore it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidStateError {
    #[error("an answer has already been submitted for this question")]
    AlreadySubmitted,
    #[error("no answer has been submitted for this question yet")]
    NotSubmitted,
    #[error("no option is selected")]
    NoSelection,
    #[error("option {index} is out of range for {len} options")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("the assessment is already completed")]
    SessionCompleted,
    #[error("no explanation is pending for this question")]
    NoPendingExplanation,
    #[error("explanation ticket {ticket} is no longer pending")]
    StaleExplanation { ticket: u64 },
}
