use chrono::Utc;
use quiz_core::model::{QuizId, QuizTopic};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::documents::QuizDocument;
use crate::repository::{QuizCatalog, QuizCatalogWriter, StorageError};

fn decode_document(raw: &str) -> Result<QuizTopic, StorageError> {
    let document: QuizDocument = serde_json::from_str(raw).map_err(ser)?;
    document.into_topic().map_err(ser)
}

#[async_trait::async_trait]
impl QuizCatalog for SqliteRepository {
    async fn list_quizzes(&self) -> Result<Vec<QuizTopic>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT document
                FROM quizzes
                ORDER BY topic ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get("document").map_err(ser)?;
            out.push(decode_document(&raw)?);
        }
        Ok(out)
    }

    async fn fetch_quiz_by_topic(&self, id: &QuizId) -> Result<QuizTopic, StorageError> {
        let row = sqlx::query("SELECT document FROM quizzes WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        let raw: String = row.try_get("document").map_err(ser)?;
        decode_document(&raw)
    }
}

#[async_trait::async_trait]
impl QuizCatalogWriter for SqliteRepository {
    async fn upsert_quiz(&self, quiz: &QuizTopic) -> Result<(), StorageError> {
        let document = serde_json::to_string(&QuizDocument::from_topic(quiz)).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO quizzes (id, topic, document, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    topic = excluded.topic,
                    document = excluded.document,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(quiz.id().as_str())
        .bind(quiz.topic())
        .bind(document)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
