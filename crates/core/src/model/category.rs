use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{CategoryId, QuizId};
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,

    #[error("quiz topic cannot be empty")]
    EmptyTopic,

    #[error("duplicate category id: {0}")]
    DuplicateCategory(CategoryId),
}

/// A themed bundle of questions attempted as one scored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: CategoryId,
    name: String,
    description: String,
    questions: Vec<Question>,
}

impl Category {
    /// Creates a category. An empty question list is allowed.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyName` if the display name is blank.
    pub fn new(
        id: CategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, CategoryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CategoryError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            description: description.into(),
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// A quiz topic as served by the catalog: a named group of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizTopic {
    id: QuizId,
    topic: String,
    info: String,
    logo: Option<String>,
    categories: Vec<Category>,
}

impl QuizTopic {
    /// Creates a quiz topic.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyTopic` for a blank topic name and
    /// `CategoryError::DuplicateCategory` if two categories share an id.
    pub fn new(
        id: QuizId,
        topic: impl Into<String>,
        info: impl Into<String>,
        logo: Option<String>,
        categories: Vec<Category>,
    ) -> Result<Self, CategoryError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(CategoryError::EmptyTopic);
        }

        let mut ids = HashSet::new();
        for category in &categories {
            if !ids.insert(category.id()) {
                return Err(CategoryError::DuplicateCategory(category.id().clone()));
            }
        }

        Ok(Self {
            id,
            topic,
            info: info.into(),
            logo,
            categories,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn info(&self) -> &str {
        &self.info
    }

    #[must_use]
    pub fn logo(&self) -> Option<&str> {
        self.logo.as_deref()
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str) -> Category {
        Category::new(CategoryId::new(id), "Basics", "", Vec::new()).unwrap()
    }

    #[test]
    fn rejects_blank_category_name() {
        let err = Category::new(CategoryId::new("c1"), " ", "", Vec::new()).unwrap_err();
        assert_eq!(err, CategoryError::EmptyName);
    }

    #[test]
    fn rejects_duplicate_category_ids() {
        let err = QuizTopic::new(
            QuizId::new("q1"),
            "Rust",
            "",
            None,
            vec![category("c1"), category("c1")],
        )
        .unwrap_err();
        assert_eq!(err, CategoryError::DuplicateCategory(CategoryId::new("c1")));
    }

    #[test]
    fn finds_category_by_id() {
        let topic = QuizTopic::new(
            QuizId::new("q1"),
            "Rust",
            "Systems",
            None,
            vec![category("c1"), category("c2")],
        )
        .unwrap();
        assert!(topic.category(&CategoryId::new("c2")).is_some());
        assert!(topic.category(&CategoryId::new("c3")).is_none());
    }
}
