//! Catalog seeding from a JSON array of quiz documents.

use quiz_core::model::QuizTopic;

use crate::documents::QuizDocument;
use crate::repository::{QuizCatalogWriter, StorageError};

/// Parse and validate a JSON array of quiz documents.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the JSON is malformed or a
/// document fails domain validation.
pub fn parse_catalog(json: &str) -> Result<Vec<QuizTopic>, StorageError> {
    let documents: Vec<QuizDocument> =
        serde_json::from_str(json).map_err(|err| StorageError::Serialization(err.to_string()))?;
    documents
        .into_iter()
        .map(|doc| {
            let id = doc.id.clone();
            doc.into_topic()
                .map_err(|err| StorageError::Serialization(format!("quiz {id}: {err}")))
        })
        .collect()
}

/// Upsert every topic; returns how many were written.
///
/// # Errors
///
/// Returns the first `StorageError` raised by the writer.
pub async fn seed_catalog(
    writer: &dyn QuizCatalogWriter,
    topics: &[QuizTopic],
) -> Result<usize, StorageError> {
    for topic in topics {
        writer.upsert_quiz(topic).await?;
        tracing::debug!(quiz_id = %topic.id(), "seeded quiz topic");
    }
    Ok(topics.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryRepository, QuizCatalog};

    const CATALOG: &str = r#"[
        {"_id": "rust", "topic": "Rust", "categories": [
            {"_id": "c1", "category": "Ownership", "questions": [
                {"question": "Is String Copy?", "options": [{"answer": "yes"}, {"answer": "no"}], "answer": ["no"]}
            ]}
        ]},
        {"_id": "go", "topic": "Go"}
    ]"#;

    #[tokio::test]
    async fn seeds_every_topic() {
        let topics = parse_catalog(CATALOG).unwrap();
        let repo = InMemoryRepository::new();
        assert_eq!(seed_catalog(&repo, &topics).await.unwrap(), 2);
        assert_eq!(repo.list_quizzes().await.unwrap().len(), 2);
    }

    #[test]
    fn invalid_document_names_the_quiz() {
        let err = parse_catalog(r#"[{"_id": "bad", "topic": "  "}]"#).unwrap_err();
        let StorageError::Serialization(message) = err else {
            panic!("expected serialization error");
        };
        assert!(message.starts_with("quiz bad:"));
    }
}
