use quiz_core::model::{CategoryId, IssueReport, QuizId, QuizRecord, QuizRecordSubmission, UserId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u32_column(row: &sqlx::sqlite::SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn map_record_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuizRecordSubmission, StorageError> {
    let record = QuizRecord::from_persisted(
        u32_column(row, "score")?,
        u32_column(row, "total_questions")?,
        u32_column(row, "correct_answers")?,
        u32_column(row, "incorrect_answers")?,
        row.try_get::<f64, _>("accuracy").map_err(ser)?,
        u32_column(row, "attempts")?,
    );

    Ok(QuizRecordSubmission {
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        quiz_id: QuizId::new(row.try_get::<String, _>("quiz_id").map_err(ser)?),
        category_id: CategoryId::new(row.try_get::<String, _>("category_id").map_err(ser)?),
        category_name: row.try_get("category_name").map_err(ser)?,
        record,
    })
}

pub(crate) fn map_issue_row(row: &sqlx::sqlite::SqliteRow) -> Result<IssueReport, StorageError> {
    Ok(IssueReport {
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        quiz_id: QuizId::new(row.try_get::<String, _>("quiz_id").map_err(ser)?),
        category_id: CategoryId::new(row.try_get::<String, _>("category_id").map_err(ser)?),
    })
}
