//! Adaptive assessment state machine.
//!
//! `AssessmentSession` owns the mutable state of one attempt over a shared,
//! read-only `QuestionBank`. Every operation checks its precondition and
//! returns `InvalidStateError` without touching the session when it does not
//! hold. Nothing here performs I/O: remote explanations leave the session as an
//! `ExplanationRequest` and come back through `resolve_explanation`.

mod phase;
mod summary;

use std::sync::Arc;

use crate::error::InvalidStateError;
use crate::model::{Question, QuestionBank, QuestionId};
use crate::time::Countdown;

pub use phase::{Explanation, ExplanationTicket, QuestionPhase, Verdict};
pub use summary::{AnswerRecord, AssessmentSummary, SubjectTally};

/// Fixed theta penalty for an incorrect answer, whatever the difficulty.
pub const INCORRECT_PENALTY: f64 = 0.2;

/// Shown for an incorrect answer when neither the service nor the question
/// provides an explanation.
pub const GENERIC_INCORRECT_MESSAGE: &str = "Réponse incorrecte.";

/// Theta change for one submitted answer.
///
/// A simplified stand-in for an IRT ability update: harder items give a larger
/// step when answered correctly, a miss always costs `INCORRECT_PENALTY`.
#[must_use]
pub fn theta_delta(difficulty: f64, correct: bool) -> f64 {
    if correct {
        0.5 * (difficulty + 2.0)
    } else {
        -INCORRECT_PENALTY
    }
}

/// Where explanations for incorrect answers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationSource {
    /// Use the question's own explanation text (no credential configured).
    Local,
    /// Ask the generative-text service.
    Remote,
}

/// Inputs for a remote explanation of an incorrect answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationRequest {
    pub ticket: ExplanationTicket,
    pub question_id: QuestionId,
    pub question: String,
    pub chosen_answer: String,
    pub correct_answer: String,
}

/// Result of a successful `submit`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub question_id: QuestionId,
    pub correct: bool,
    pub theta_delta: f64,
    /// Set only for incorrect answers with `ExplanationSource::Remote`.
    pub explanation_request: Option<ExplanationRequest>,
}

/// Result of a successful `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    /// The last question was left. Returned once per session.
    Completed,
}

/// Read model for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentSnapshot {
    pub current_index: usize,
    pub question_count: usize,
    pub selected_option: Option<usize>,
    pub submitted: bool,
    pub last_answer_correct: Option<bool>,
    pub score: u32,
    pub theta: f64,
    pub remaining_secs: u32,
    pub explanation_text: Option<String>,
    pub loading_explanation: bool,
    pub completed: bool,
}

impl AssessmentSnapshot {
    /// Share of questions already left behind, in percent.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        if self.question_count == 0 {
            return 0;
        }
        let done = if self.completed {
            self.question_count
        } else {
            self.current_index
        };
        u32::try_from(done * 100 / self.question_count).unwrap_or(100)
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.question_count
    }
}

fn local_explanation(question: &Question) -> String {
    question
        .explanation()
        .unwrap_or(GENERIC_INCORRECT_MESSAGE)
        .to_string()
}

/// One assessment attempt.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    bank: Arc<QuestionBank>,
    current: usize,
    phase: QuestionPhase,
    score: u32,
    theta: f64,
    countdown: Countdown,
    explanations: ExplanationSource,
    next_ticket: u64,
    completed: bool,
    results: Vec<AnswerRecord>,
}

impl AssessmentSession {
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>, explanations: ExplanationSource) -> Self {
        Self {
            bank,
            current: 0,
            phase: QuestionPhase::Unanswered,
            score: 0,
            theta: 0.0,
            countdown: Countdown::default(),
            explanations,
            next_ticket: 0,
            completed: false,
            results: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_countdown(mut self, countdown: Countdown) -> Self {
        self.countdown = countdown;
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        // `current` never leaves the bank and the bank is never empty.
        &self.bank.questions()[self.current]
    }

    #[must_use]
    pub fn phase(&self) -> &QuestionPhase {
        &self.phase
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn theta(&self) -> f64 {
        self.theta
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    #[must_use]
    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn results(&self) -> &[AnswerRecord] {
        &self.results
    }

    /// Choose an option for the current question.
    ///
    /// # Errors
    ///
    /// `AlreadySubmitted` once the answer is submitted, `OptionOutOfRange` for an
    /// index outside the current question's options.
    pub fn select_option(&mut self, index: usize) -> Result<(), InvalidStateError> {
        if self.phase.is_submitted() {
            return Err(InvalidStateError::AlreadySubmitted);
        }
        let len = self.current_question().options().len();
        if index >= len {
            return Err(InvalidStateError::OptionOutOfRange { index, len });
        }
        self.phase = QuestionPhase::Selected { option: index };
        Ok(())
    }

    /// Submit the selected option, scoring it and updating theta exactly once.
    ///
    /// # Errors
    ///
    /// `AlreadySubmitted` on a second submit, `NoSelection` when nothing is selected.
    pub fn submit(&mut self) -> Result<SubmitOutcome, InvalidStateError> {
        let option = match self.phase {
            QuestionPhase::Unanswered => return Err(InvalidStateError::NoSelection),
            QuestionPhase::Submitted { .. } => return Err(InvalidStateError::AlreadySubmitted),
            QuestionPhase::Selected { option } => option,
        };

        let question = &self.bank.questions()[self.current];
        let question_id = question.id();
        let correct = question.is_correct(option);
        let delta = theta_delta(question.difficulty(), correct);

        let (verdict, explanation_request) = if correct {
            (Verdict::Correct, None)
        } else {
            match self.explanations {
                ExplanationSource::Remote => {
                    let ticket = ExplanationTicket::new(self.next_ticket);
                    let request = ExplanationRequest {
                        ticket,
                        question_id,
                        question: question.content().to_string(),
                        chosen_answer: question.option(option).unwrap_or_default().to_string(),
                        correct_answer: question.correct_answer().to_string(),
                    };
                    (
                        Verdict::Incorrect(Explanation::Pending(ticket)),
                        Some(request),
                    )
                }
                ExplanationSource::Local => (
                    Verdict::Incorrect(Explanation::Ready(local_explanation(question))),
                    None,
                ),
            }
        };

        self.results.push(AnswerRecord {
            question_id,
            subject: question.subject(),
            option,
            correct,
            theta_delta: delta,
        });
        if explanation_request.is_some() {
            self.next_ticket += 1;
        }
        if correct {
            self.score += 1;
        }
        self.theta += delta;
        self.phase = QuestionPhase::Submitted { option, verdict };

        Ok(SubmitOutcome {
            question_id,
            correct,
            theta_delta: delta,
            explanation_request,
        })
    }

    /// Attach the text produced for a pending explanation.
    ///
    /// # Errors
    ///
    /// `StaleExplanation` when the ticket is not the one awaited by the current
    /// question (answered earlier, or the question was left), and
    /// `NoPendingExplanation` for a ticket this session never issued.
    pub fn resolve_explanation(
        &mut self,
        ticket: ExplanationTicket,
        text: impl Into<String>,
    ) -> Result<(), InvalidStateError> {
        if self.phase.pending_ticket() == Some(ticket) {
            if let QuestionPhase::Submitted { verdict, .. } = &mut self.phase {
                *verdict = Verdict::Incorrect(Explanation::Ready(text.into()));
            }
            return Ok(());
        }
        if ticket.value() < self.next_ticket {
            Err(InvalidStateError::StaleExplanation {
                ticket: ticket.value(),
            })
        } else {
            Err(InvalidStateError::NoPendingExplanation)
        }
    }

    /// Leave the submitted question.
    ///
    /// # Errors
    ///
    /// `NotSubmitted` before the current answer is submitted and
    /// `SessionCompleted` after completion was already signaled.
    pub fn advance(&mut self) -> Result<Advance, InvalidStateError> {
        if self.completed {
            return Err(InvalidStateError::SessionCompleted);
        }
        if !self.phase.is_submitted() {
            return Err(InvalidStateError::NotSubmitted);
        }
        if self.current + 1 >= self.bank.len() {
            // Nothing can resolve the last explanation after completion.
            if self.phase.pending_ticket().is_some() {
                let text = local_explanation(self.current_question());
                if let QuestionPhase::Submitted { verdict, .. } = &mut self.phase {
                    *verdict = Verdict::Incorrect(Explanation::Ready(text));
                }
            }
            self.completed = true;
            return Ok(Advance::Completed);
        }
        self.current += 1;
        self.phase = QuestionPhase::Unanswered;
        Ok(Advance::Next {
            index: self.current,
        })
    }

    /// One elapsed second. Never changes question state.
    pub fn tick(&mut self) {
        self.countdown.tick();
    }

    #[must_use]
    pub fn snapshot(&self) -> AssessmentSnapshot {
        let last_answer_correct = match &self.phase {
            QuestionPhase::Submitted { verdict, .. } => Some(verdict.is_correct()),
            _ => None,
        };
        AssessmentSnapshot {
            current_index: self.current,
            question_count: self.bank.len(),
            selected_option: self.phase.selected_option(),
            submitted: self.phase.is_submitted(),
            last_answer_correct,
            score: self.score,
            theta: self.theta,
            remaining_secs: self.countdown.remaining_secs(),
            explanation_text: self.phase.explanation_text().map(str::to_string),
            loading_explanation: self.phase.pending_ticket().is_some(),
            completed: self.completed,
        }
    }

    #[must_use]
    pub fn summary(&self) -> AssessmentSummary {
        AssessmentSummary::from_records(
            &self.results,
            self.bank.len(),
            self.theta,
            self.countdown.remaining_secs(),
        )
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
