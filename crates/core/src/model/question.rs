use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

/// Subject a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Maths,
    Physique,
    #[serde(rename = "SVT")]
    Svt,
    #[serde(rename = "Français")]
    Francais,
}

impl Subject {
    pub const ALL: [Subject; 4] = [
        Subject::Maths,
        Subject::Physique,
        Subject::Svt,
        Subject::Francais,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Subject::Maths => "Maths",
            Subject::Physique => "Physique",
            Subject::Svt => "SVT",
            Subject::Francais => "Français",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question content cannot be empty")]
    EmptyContent,
    #[error("a question needs at least two options, got {0}")]
    TooFewOptions(usize),
    #[error("option {0} is empty")]
    EmptyOption(usize),
    #[error("correct index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },
    #[error("difficulty must be finite, got {0}")]
    NonFiniteDifficulty(f64),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question record, as supplied by a question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub subject: Subject,
    pub content: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub difficulty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Check the record and turn it into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when content or an option is blank, fewer than two
    /// options are given, `correct_index` does not point at an option, or the
    /// difficulty is NaN or infinite.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.content.trim().is_empty() {
            return Err(QuestionError::EmptyContent);
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions(self.options.len()));
        }
        if let Some(pos) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption(pos));
        }
        if self.correct_index >= self.options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_index,
                len: self.options.len(),
            });
        }
        if !self.difficulty.is_finite() {
            return Err(QuestionError::NonFiniteDifficulty(self.difficulty));
        }

        let explanation = self
            .explanation
            .filter(|text| !text.trim().is_empty());

        Ok(Question {
            id: self.id,
            subject: self.subject,
            content: self.content,
            options: self.options,
            correct_index: self.correct_index,
            difficulty: self.difficulty,
            explanation,
        })
    }
}

/// A multiple-choice question. Read-only once built.
///
/// `difficulty` is an IRT-style parameter, conventionally in `[-3, 3]`. It is
/// only read by the scoring rule, never recalibrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    subject: Subject,
    content: String,
    options: Vec<String>,
    correct_index: usize,
    difficulty: f64,
    explanation: Option<String>,
}

impl Question {
    /// # Errors
    ///
    /// See [`QuestionDraft::validate`].
    pub fn new(
        id: QuestionId,
        subject: Subject,
        content: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        difficulty: f64,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        QuestionDraft {
            id,
            subject,
            content: content.into(),
            options,
            correct_index,
            difficulty,
            explanation,
        }
        .validate()
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_index
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Question> for QuestionDraft {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            subject: question.subject,
            content: question.content,
            options: question.options,
            correct_index: question.correct_index,
            difficulty: question.difficulty,
            explanation: question.explanation,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(1),
            subject: Subject::Maths,
            content: "2 + 2 ?".into(),
            options: vec!["3".into(), "4".into()],
            correct_index: 1,
            difficulty: 0.0,
            explanation: None,
        }
    }

    #[test]
    fn valid_draft_builds_question() {
        let q = draft().validate().unwrap();
        assert_eq!(q.correct_answer(), "4");
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
        assert_eq!(q.option(5), None);
    }

    #[test]
    fn blank_content_is_rejected() {
        let err = QuestionDraft {
            content: "   ".into(),
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyContent);
    }

    #[test]
    fn single_option_is_rejected() {
        let err = QuestionDraft {
            options: vec!["only".into()],
            correct_index: 0,
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions(1));
    }

    #[test]
    fn correct_index_must_point_at_an_option() {
        let err = QuestionDraft {
            correct_index: 2,
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            QuestionError::CorrectIndexOutOfRange { index: 2, len: 2 }
        );
    }

    #[test]
    fn nan_difficulty_is_rejected() {
        let err = QuestionDraft {
            difficulty: f64::NAN,
            ..draft()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, QuestionError::NonFiniteDifficulty(_)));
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let q = QuestionDraft {
            explanation: Some("  ".into()),
            ..draft()
        }
        .validate()
        .unwrap();
        assert_eq!(q.explanation(), None);
    }

    #[test]
    fn deserializes_camel_case_records() {
        let json = r#"{
            "id": 9,
            "subject": "Français",
            "content": "Quel est le sujet ?",
            "options": ["Le verbe", "Le nom"],
            "correctIndex": 1,
            "difficulty": -0.5
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id(), QuestionId::new(9));
        assert_eq!(q.subject(), Subject::Francais);
        assert_eq!(q.explanation(), None);
    }

    #[test]
    fn deserialization_runs_validation() {
        let json = r#"{
            "id": 9, "subject": "SVT", "content": "x",
            "options": ["a", "b"], "correctIndex": 4, "difficulty": 0
        }"#;
        assert!(serde_json::from_str::<Question>(json).is_err());
    }

    #[test]
    fn subject_labels_match_wire_names() {
        for subject in Subject::ALL {
            let json = serde_json::to_string(&subject).unwrap();
            assert_eq!(json, format!("\"{}\"", subject.label()));
        }
    }
}
