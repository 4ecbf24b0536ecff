//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::IssueError;
use storage::repository::StorageError;

use crate::sessions::PhaseKind;

/// Errors emitted by the session controller and its runner.
///
/// Record and issue submission failures are deliberately absent: both are
/// best-effort and only show up in logs and the transient issue status.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("failed to load quiz data: {0}")]
    DataFetch(#[source] StorageError),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("question index {index} out of range (0..{count})")]
    QuestionOutOfRange { index: usize, count: usize },
    #[error("option {0:?} is not offered by this question")]
    UnknownOption(String),
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: PhaseKind,
    },
    #[error(transparent)]
    Issue(#[from] IssueError),
    #[error("session runner has stopped")]
    Closed,
}

/// Errors emitted while loading or validating `EngineConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("{0} must be at least 1")]
    NonPositive(&'static str),
    #[error("invalid api base url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// Errors emitted by `QuizApiClient` construction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizApiError {
    #[error("api base url is not configured")]
    Disabled,
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
