use crate::model::ids::{CategoryId, QuizId, UserId};
use crate::scoring::ScoreCard;

/// Scoring summary produced once, when a session becomes complete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizRecord {
    score: u32,
    total_questions: u32,
    correct_answers: u32,
    incorrect_answers: u32,
    accuracy: f64,
    attempts: u32,
}

impl QuizRecord {
    /// Builds the record for a single attempt.
    #[must_use]
    pub fn from_score(card: &ScoreCard) -> Self {
        Self {
            score: card.score(),
            total_questions: card.total_questions(),
            correct_answers: card.correct(),
            incorrect_answers: card.incorrect(),
            accuracy: card.accuracy(),
            attempts: 1,
        }
    }

    /// Rehydrate a record from persisted storage.
    #[must_use]
    pub fn from_persisted(
        score: u32,
        total_questions: u32,
        correct_answers: u32,
        incorrect_answers: u32,
        accuracy: f64,
        attempts: u32,
    ) -> Self {
        Self {
            score,
            total_questions,
            correct_answers,
            incorrect_answers,
            accuracy,
            attempts,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> u32 {
        self.incorrect_answers
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// The identifiers of a finished attempt together with its record.
///
/// Carries everything needed for persistence except the user, which is
/// supplied by the caller at delivery time.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedAttempt {
    pub quiz_id: QuizId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub record: QuizRecord,
}

impl CompletedAttempt {
    #[must_use]
    pub fn into_submission(self, user_id: UserId) -> QuizRecordSubmission {
        QuizRecordSubmission {
            user_id,
            quiz_id: self.quiz_id,
            category_id: self.category_id,
            category_name: self.category_name,
            record: self.record,
        }
    }
}

/// A quiz record addressed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizRecordSubmission {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub record: QuizRecord,
}
