use std::fmt;

/// Identifies one outstanding explanation request.
///
/// Tickets are unique within a session, so a completion carrying an old ticket
/// can be told apart from the one currently awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExplanationTicket(u64);

impl ExplanationTicket {
    #[must_use]
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExplanationTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Explanation attached to an incorrect answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Explanation {
    /// Waiting on the generative-text service.
    Pending(ExplanationTicket),
    Ready(String),
}

/// Result of a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect(Explanation),
}

impl Verdict {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

/// Per-question state.
///
/// `Unanswered -> Selected -> Submitted`; only `advance` leaves `Submitted`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuestionPhase {
    #[default]
    Unanswered,
    Selected {
        option: usize,
    },
    Submitted {
        option: usize,
        verdict: Verdict,
    },
}

impl QuestionPhase {
    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        match self {
            QuestionPhase::Unanswered => None,
            QuestionPhase::Selected { option } | QuestionPhase::Submitted { option, .. } => {
                Some(*option)
            }
        }
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self, QuestionPhase::Submitted { .. })
    }

    #[must_use]
    pub fn explanation_text(&self) -> Option<&str> {
        match self {
            QuestionPhase::Submitted {
                verdict: Verdict::Incorrect(Explanation::Ready(text)),
                ..
            } => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn pending_ticket(&self) -> Option<ExplanationTicket> {
        match self {
            QuestionPhase::Submitted {
                verdict: Verdict::Incorrect(Explanation::Pending(ticket)),
                ..
            } => Some(*ticket),
            _ => None,
        }
    }
}
