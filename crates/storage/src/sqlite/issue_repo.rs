use chrono::Utc;
use quiz_core::model::{IssueReport, QuizId};

use super::SqliteRepository;
use super::mapping::{conn, map_issue_row};
use crate::repository::{IssueHistory, IssueSink, StorageError};

#[async_trait::async_trait]
impl IssueSink for SqliteRepository {
    async fn submit_issue(&self, report: &IssueReport) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO issues (quiz_id, category_id, title, description, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(report.quiz_id.as_str())
        .bind(report.category_id.as_str())
        .bind(report.title.as_str())
        .bind(report.description.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl IssueHistory for SqliteRepository {
    async fn list_issues_for_quiz(
        &self,
        quiz_id: &QuizId,
    ) -> Result<Vec<IssueReport>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT quiz_id, category_id, title, description
                FROM issues
                WHERE quiz_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(quiz_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_issue_row).collect()
    }
}
