use crate::model::{QuestionId, Subject};

/// What happened when one question was submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub subject: Subject,
    pub option: usize,
    pub correct: bool,
    pub theta_delta: f64,
}

/// Answered/correct counts for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectTally {
    pub subject: Subject,
    pub answered: u32,
    pub correct: u32,
}

impl SubjectTally {
    /// Percentage of correct answers, 0 when nothing was answered.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.answered == 0 {
            return 0;
        }
        self.correct * 100 / self.answered
    }
}

/// End-of-assessment report.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentSummary {
    pub score: u32,
    pub answered: u32,
    pub total_questions: usize,
    pub theta: f64,
    pub remaining_secs: u32,
    pub by_subject: Vec<SubjectTally>,
}

impl AssessmentSummary {
    pub(crate) fn from_records(
        records: &[AnswerRecord],
        total_questions: usize,
        theta: f64,
        remaining_secs: u32,
    ) -> Self {
        let mut by_subject: Vec<SubjectTally> = Vec::new();
        for record in records {
            let idx = match by_subject.iter().position(|t| t.subject == record.subject) {
                Some(idx) => idx,
                None => {
                    by_subject.push(SubjectTally {
                        subject: record.subject,
                        answered: 0,
                        correct: 0,
                    });
                    by_subject.len() - 1
                }
            };
            let tally = &mut by_subject[idx];
            tally.answered += 1;
            if record.correct {
                tally.correct += 1;
            }
        }

        let score = records.iter().filter(|r| r.correct).count();
        Self {
            score: u32::try_from(score).unwrap_or(u32::MAX),
            answered: u32::try_from(records.len()).unwrap_or(u32::MAX),
            total_questions,
            theta,
            remaining_secs,
            by_subject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, subject: Subject, correct: bool) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId::new(id),
            subject,
            option: 0,
            correct,
            theta_delta: 0.0,
        }
    }

    #[test]
    fn tallies_follow_first_appearance_order() {
        let records = vec![
            record(1, Subject::Physique, true),
            record(2, Subject::Maths, false),
            record(3, Subject::Physique, false),
        ];
        let summary = AssessmentSummary::from_records(&records, 5, 0.4, 120);

        assert_eq!(summary.score, 1);
        assert_eq!(summary.answered, 3);
        assert_eq!(summary.by_subject.len(), 2);
        assert_eq!(summary.by_subject[0].subject, Subject::Physique);
        assert_eq!(summary.by_subject[0].answered, 2);
        assert_eq!(summary.by_subject[0].percent(), 50);
        assert_eq!(summary.by_subject[1].percent(), 0);
    }

    #[test]
    fn empty_records_give_empty_summary() {
        let summary = AssessmentSummary::from_records(&[], 5, 0.0, 600);
        assert_eq!(summary.score, 0);
        assert!(summary.by_subject.is_empty());
    }
}
