use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{Question, QuestionDraft, QuestionError, Subject};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
    #[error("invalid question {id}: {source}")]
    Question {
        id: QuestionId,
        #[source]
        source: QuestionError,
    },
    #[error("malformed question bank: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ordered, non-empty set of questions. Order is presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `BankError::Empty` for an empty list and `BankError::DuplicateId`
    /// when two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(BankError::DuplicateId(question.id()));
            }
        }
        Ok(Self { questions })
    }

    /// Parse a JSON array of question records.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Parse` for malformed JSON, `BankError::Question` when a
    /// record fails validation, plus the errors of [`QuestionBank::new`].
    pub fn from_json(raw: &str) -> Result<Self, BankError> {
        let drafts: Vec<QuestionDraft> = serde_json::from_str(raw)?;
        let questions = drafts
            .into_iter()
            .map(|draft| {
                let id = draft.id;
                draft
                    .validate()
                    .map_err(|source| BankError::Question { id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    /// The five-question demo bank shipped with the dashboard.
    ///
    /// # Errors
    ///
    /// Same checks as [`QuestionBank::from_json`]; the shipped data passes them.
    pub fn builtin() -> Result<Self, BankError> {
        let questions = builtin_drafts()
            .into_iter()
            .map(|draft| {
                let id = draft.id;
                draft
                    .validate()
                    .map_err(|source| BankError::Question { id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

fn draft(
    id: u64,
    subject: Subject,
    content: &str,
    options: [&str; 4],
    correct_index: usize,
    difficulty: f64,
    explanation: &str,
) -> QuestionDraft {
    QuestionDraft {
        id: QuestionId::new(id),
        subject,
        content: content.to_string(),
        options: options.iter().map(ToString::to_string).collect(),
        correct_index,
        difficulty,
        explanation: Some(explanation.to_string()),
    }
}

fn builtin_drafts() -> Vec<QuestionDraft> {
    vec![
        draft(
            1,
            Subject::Maths,
            "Quelle est la dérivée de la fonction f(x) = x² * ln(x) ?",
            ["2x * ln(x) + x", "2x * ln(x)", "x * (2ln(x) + 1)", "x/2 * ln(x)"],
            0,
            -0.5,
            "On utilise la règle du produit (uv)' = u'v + uv'. Ici u=x² et v=ln(x).",
        ),
        draft(
            2,
            Subject::Physique,
            "Dans un circuit RLC série en résonance, l'impédance est :",
            ["Maximale", "Minimale et égale à R", "Nulle", "Infinie"],
            1,
            0.2,
            "À la résonance, les réactances capacitive et inductive s'annulent. Z = R.",
        ),
        draft(
            3,
            Subject::Svt,
            "La glycolyse se déroule dans :",
            [
                "La matrice mitochondriale",
                "Le hyaloplasme",
                "Les crêtes mitochondriales",
                "Le noyau",
            ],
            1,
            -1.0,
            "La glycolyse est une étape anaérobie qui se déroule dans le cytoplasme (hyaloplasme).",
        ),
        draft(
            4,
            Subject::Maths,
            "Si la limite de f(x) quand x tend vers +infini est 3, alors la droite y=3 est :",
            [
                "Asymptote verticale",
                "Asymptote oblique",
                "Asymptote horizontale",
                "Tangente",
            ],
            2,
            -1.5,
            "Par définition, si lim f(x) = L quand x->inf, y=L est asymptote horizontale.",
        ),
        draft(
            5,
            Subject::Physique,
            "L'énergie cinétique d'un solide en rotation est donnée par :",
            ["1/2 mv²", "1/2 Jω²", "mgh", "Jω"],
            1,
            1.0,
            "C'est l'analogue de 1/2 mv² mais avec le moment d'inertie J et la vitesse angulaire ω.",
        ),
    ]
}
