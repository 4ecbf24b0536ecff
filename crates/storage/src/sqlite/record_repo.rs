use chrono::Utc;
use quiz_core::model::{QuizRecordSubmission, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_record_row};
use crate::repository::{QuizRecordSink, RecordHistory, StorageError};

#[async_trait::async_trait]
impl QuizRecordSink for SqliteRepository {
    async fn submit_record(&self, submission: &QuizRecordSubmission) -> Result<(), StorageError> {
        let record = &submission.record;

        sqlx::query(
            r"
                INSERT INTO quiz_records (
                    user_id, quiz_id, category_id, category_name, score,
                    total_questions, correct_answers, incorrect_answers,
                    attempts, accuracy, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
        )
        .bind(submission.user_id.as_str())
        .bind(submission.quiz_id.as_str())
        .bind(submission.category_id.as_str())
        .bind(submission.category_name.as_str())
        .bind(i64::from(record.score()))
        .bind(i64::from(record.total_questions()))
        .bind(i64::from(record.correct_answers()))
        .bind(i64::from(record.incorrect_answers()))
        .bind(i64::from(record.attempts()))
        .bind(record.accuracy())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordHistory for SqliteRepository {
    async fn list_records_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<QuizRecordSubmission>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    user_id, quiz_id, category_id, category_name, score,
                    total_questions, correct_answers, incorrect_answers,
                    attempts, accuracy
                FROM quiz_records
                WHERE user_id = ?1
                ORDER BY recorded_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_record_row(&row)?);
        }
        Ok(out)
    }
}
