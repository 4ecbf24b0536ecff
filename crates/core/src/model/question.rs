use rand::Rng;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::shuffle::shuffled;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question must offer at least one option")]
    NoOptions,

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("question must have at least one correct answer")]
    NoCorrectAnswers,

    #[error("correct answer is not one of the options: {0}")]
    UnknownCorrectAnswer(String),
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// A single answer string. Two options are the same option iff their text is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnswerOption(String);

impl AnswerOption {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AnswerOption {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-answer question.
///
/// Options keep their presentation order; the correct answers are a set, so
/// their order never matters for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: Vec<AnswerOption>,
    correct: BTreeSet<String>,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are no options,
    /// an option repeats, no correct answer is given, or a correct answer
    /// is not one of the options.
    pub fn new(
        text: impl Into<String>,
        options: Vec<AnswerOption>,
        correct: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }

        let mut seen = BTreeSet::new();
        for option in &options {
            if !seen.insert(option.text()) {
                return Err(QuestionError::DuplicateOption(option.text().to_owned()));
            }
        }

        let correct: BTreeSet<String> = correct.into_iter().map(Into::into).collect();
        if correct.is_empty() {
            return Err(QuestionError::NoCorrectAnswers);
        }
        if let Some(unknown) = correct.iter().find(|answer| !seen.contains(answer.as_str())) {
            return Err(QuestionError::UnknownCorrectAnswer(unknown.clone()));
        }

        Ok(Self {
            text,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn correct_answers(&self) -> &BTreeSet<String> {
        &self.correct
    }

    #[must_use]
    pub fn has_option(&self, text: &str) -> bool {
        self.options.iter().any(|option| option.text() == text)
    }

    #[must_use]
    pub fn is_correct_option(&self, text: &str) -> bool {
        self.correct.contains(text)
    }

    /// Returns a copy of this question with its options in a fresh random order.
    #[must_use]
    pub fn with_shuffled_options<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Self {
            text: self.text.clone(),
            options: shuffled(&self.options, rng),
            correct: self.correct.clone(),
        }
    }
}
