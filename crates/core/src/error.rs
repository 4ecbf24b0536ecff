use thiserror::Error;

use crate::model::{CategoryError, IssueError, QuestionError};

/// Any domain validation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Issue(#[from] IssueError),
}
