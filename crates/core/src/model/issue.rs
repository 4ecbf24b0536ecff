use thiserror::Error;

use crate::model::ids::{CategoryId, QuizId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IssueError {
    #[error("issue title is required")]
    MissingTitle,

    #[error("issue description is required")]
    MissingDescription,
}

/// User-entered issue form contents, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
}

impl IssueDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Validate the draft and attach the quiz/category it refers to.
    ///
    /// # Errors
    ///
    /// Returns `IssueError` when the title or description is blank.
    pub fn validate(
        self,
        quiz_id: QuizId,
        category_id: CategoryId,
    ) -> Result<IssueReport, IssueError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(IssueError::MissingTitle);
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(IssueError::MissingDescription);
        }

        Ok(IssueReport {
            title: title.to_owned(),
            description: description.to_owned(),
            quiz_id,
            category_id,
        })
    }
}

/// A validated dispute or feedback report about a completed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueReport {
    pub title: String,
    pub description: String,
    pub quiz_id: QuizId,
    pub category_id: CategoryId,
}
