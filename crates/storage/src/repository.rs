use async_trait::async_trait;
use quiz_core::model::{IssueReport, QuizId, QuizRecordSubmission, QuizTopic, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters and remote collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("request rejected with status {status}")]
    Rejected { status: u16 },
}

/// Read side of the quiz catalog.
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    /// List every quiz topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_quizzes(&self) -> Result<Vec<QuizTopic>, StorageError>;

    /// Fetch one quiz topic with all of its categories.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the topic is unknown, or other storage errors.
    async fn fetch_quiz_by_topic(&self, id: &QuizId) -> Result<QuizTopic, StorageError>;
}

/// Write side of the catalog, available on local backends.
#[async_trait]
pub trait QuizCatalogWriter: Send + Sync {
    /// Insert or replace a quiz topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the topic cannot be stored.
    async fn upsert_quiz(&self, quiz: &QuizTopic) -> Result<(), StorageError>;
}

/// Destination for completed quiz records.
#[async_trait]
pub trait QuizRecordSink: Send + Sync {
    /// Persist a quiz record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record is not accepted.
    async fn submit_record(&self, submission: &QuizRecordSubmission) -> Result<(), StorageError>;
}

/// Read side of persisted quiz records.
#[async_trait]
pub trait RecordHistory: Send + Sync {
    /// Most recent records for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if records cannot be read.
    async fn list_records_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<QuizRecordSubmission>, StorageError>;
}

/// Destination for issue reports.
#[async_trait]
pub trait IssueSink: Send + Sync {
    /// Submit an issue report.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the report is not accepted.
    async fn submit_issue(&self, report: &IssueReport) -> Result<(), StorageError>;
}

/// Read side of submitted issues.
#[async_trait]
pub trait IssueHistory: Send + Sync {
    /// Issues filed against a quiz topic, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if issues cannot be read.
    async fn list_issues_for_quiz(&self, quiz_id: &QuizId)
    -> Result<Vec<IssueReport>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<HashMap<QuizId, QuizTopic>>>,
    records: Arc<Mutex<Vec<QuizRecordSubmission>>>,
    issues: Arc<Mutex<Vec<IssueReport>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with quiz topics.
    #[must_use]
    pub fn with_quizzes(quizzes: impl IntoIterator<Item = QuizTopic>) -> Self {
        let repo = Self::new();
        if let Ok(mut guard) = repo.quizzes.lock() {
            guard.extend(quizzes.into_iter().map(|quiz| (quiz.id().clone(), quiz)));
        }
        repo
    }
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuizCatalog for InMemoryRepository {
    async fn list_quizzes(&self) -> Result<Vec<QuizTopic>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        let mut quizzes: Vec<_> = guard.values().cloned().collect();
        quizzes.sort_by(|a, b| a.topic().cmp(b.topic()).then_with(|| a.id().cmp(b.id())));
        Ok(quizzes)
    }

    async fn fetch_quiz_by_topic(&self, id: &QuizId) -> Result<QuizTopic, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        guard.get(id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl QuizCatalogWriter for InMemoryRepository {
    async fn upsert_quiz(&self, quiz: &QuizTopic) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        guard.insert(quiz.id().clone(), quiz.clone());
        Ok(())
    }
}

#[async_trait]
impl QuizRecordSink for InMemoryRepository {
    async fn submit_record(&self, submission: &QuizRecordSubmission) -> Result<(), StorageError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        guard.push(submission.clone());
        Ok(())
    }
}

#[async_trait]
impl RecordHistory for InMemoryRepository {
    async fn list_records_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<QuizRecordSubmission>, StorageError> {
        let guard = self.records.lock().map_err(poisoned)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard
            .iter()
            .rev()
            .filter(|record| &record.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IssueSink for InMemoryRepository {
    async fn submit_issue(&self, report: &IssueReport) -> Result<(), StorageError> {
        let mut guard = self.issues.lock().map_err(poisoned)?;
        guard.push(report.clone());
        Ok(())
    }
}

#[async_trait]
impl IssueHistory for InMemoryRepository {
    async fn list_issues_for_quiz(
        &self,
        quiz_id: &QuizId,
    ) -> Result<Vec<IssueReport>, StorageError> {
        let guard = self.issues.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|issue| &issue.quiz_id == quiz_id)
            .cloned()
            .collect())
    }
}

/// Aggregates the collaborator contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn QuizCatalog>,
    pub catalog_writer: Arc<dyn QuizCatalogWriter>,
    pub records: Arc<dyn QuizRecordSink>,
    pub record_history: Arc<dyn RecordHistory>,
    pub issues: Arc<dyn IssueSink>,
    pub issue_history: Arc<dyn IssueHistory>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    pub(crate) fn from_repository<R>(repo: R) -> Self
    where
        R: QuizCatalog
            + QuizCatalogWriter
            + QuizRecordSink
            + RecordHistory
            + IssueSink
            + IssueHistory
            + Clone
            + 'static,
    {
        Self {
            catalog: Arc::new(repo.clone()),
            catalog_writer: Arc::new(repo.clone()),
            records: Arc::new(repo.clone()),
            record_history: Arc::new(repo.clone()),
            issues: Arc::new(repo.clone()),
            issue_history: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{CategoryId, QuizRecord};

    fn topic(id: &str, name: &str) -> QuizTopic {
        QuizTopic::new(QuizId::new(id), name, "", None, Vec::new()).unwrap()
    }

    fn submission(user: &str, score: u32) -> QuizRecordSubmission {
        QuizRecordSubmission {
            user_id: UserId::new(user),
            quiz_id: QuizId::new("q1"),
            category_id: CategoryId::new("c1"),
            category_name: "Basics".into(),
            record: QuizRecord::from_persisted(score, 3, score, 3 - score, 0.0, 1),
        }
    }

    #[tokio::test]
    async fn catalog_lists_by_topic_name() {
        let repo = InMemoryRepository::with_quizzes([topic("b", "Rust"), topic("a", "Go")]);
        let names: Vec<_> = repo
            .list_quizzes()
            .await
            .unwrap()
            .iter()
            .map(|q| q.topic().to_owned())
            .collect();
        assert_eq!(names, vec!["Go", "Rust"]);

        assert!(matches!(
            repo.fetch_quiz_by_topic(&QuizId::new("zzz")).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn records_are_listed_newest_first_per_user() {
        let repo = InMemoryRepository::new();
        repo.submit_record(&submission("u1", 1)).await.unwrap();
        repo.submit_record(&submission("u2", 3)).await.unwrap();
        repo.submit_record(&submission("u1", 2)).await.unwrap();

        let records = repo
            .list_records_for_user(&UserId::new("u1"), 10)
            .await
            .unwrap();
        let scores: Vec<_> = records.iter().map(|r| r.record.score()).collect();
        assert_eq!(scores, vec![2, 1]);

        let limited = repo
            .list_records_for_user(&UserId::new("u1"), 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn storage_in_memory_shares_state_across_handles() {
        let storage = Storage::in_memory();
        storage.catalog_writer.upsert_quiz(&topic("q1", "Rust")).await.unwrap();
        let fetched = storage
            .catalog
            .fetch_quiz_by_topic(&QuizId::new("q1"))
            .await
            .unwrap();
        assert_eq!(fetched.topic(), "Rust");
    }
}
