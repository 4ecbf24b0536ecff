//! Wire shapes exchanged with the quiz collaborators.
//!
//! Field names follow the collaborator's JSON (`_id`, `category`, `answer`, and
//! camelCase for submissions) so documents can travel over HTTP or be stored as-is.

use quiz_core::model::{
    AnswerOption, Category, CategoryId, IssueReport, Question, QuizId, QuizRecordSubmission,
    QuizTopic,
};
use serde::{Deserialize, Serialize};

/// Persisted/served shape of a quiz topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub topic: String,
    #[serde(default)]
    pub info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default)]
    pub categories: Vec<CategoryDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub questions: Vec<QuestionDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDocument {
    pub question: String,
    pub options: Vec<OptionDocument>,
    /// Correct answers.
    pub answer: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDocument {
    pub answer: String,
}

impl QuizDocument {
    #[must_use]
    pub fn from_topic(topic: &QuizTopic) -> Self {
        Self {
            id: topic.id().as_str().to_owned(),
            topic: topic.topic().to_owned(),
            info: topic.info().to_owned(),
            logo: topic.logo().map(str::to_owned),
            categories: topic
                .categories()
                .iter()
                .map(CategoryDocument::from_category)
                .collect(),
        }
    }

    /// Convert the document into a validated domain topic.
    ///
    /// # Errors
    ///
    /// Returns `quiz_core::Error` if any category or question fails validation.
    pub fn into_topic(self) -> Result<QuizTopic, quiz_core::Error> {
        let categories = self
            .categories
            .into_iter()
            .map(CategoryDocument::into_category)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QuizTopic::new(
            QuizId::new(self.id),
            self.topic,
            self.info,
            self.logo,
            categories,
        )?)
    }
}

impl CategoryDocument {
    fn from_category(category: &Category) -> Self {
        Self {
            id: category.id().as_str().to_owned(),
            category: category.name().to_owned(),
            info: category.description().to_owned(),
            questions: category
                .questions()
                .iter()
                .map(QuestionDocument::from_question)
                .collect(),
        }
    }

    /// Malformed questions are skipped so the rest of the category stays playable.
    fn into_category(self) -> Result<Category, quiz_core::Error> {
        let category_id = self.id;
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .filter_map(|(position, question)| match question.into_question() {
                Ok(question) => Some(question),
                Err(err) => {
                    tracing::warn!(
                        category_id = %category_id,
                        position,
                        error = %err,
                        "skipping malformed question"
                    );
                    None
                }
            })
            .collect();
        Ok(Category::new(
            CategoryId::new(category_id),
            self.category,
            self.info,
            questions,
        )?)
    }
}

impl QuestionDocument {
    fn from_question(question: &Question) -> Self {
        Self {
            question: question.text().to_owned(),
            options: question
                .options()
                .iter()
                .map(|option| OptionDocument {
                    answer: option.text().to_owned(),
                })
                .collect(),
            answer: question.correct_answers().iter().cloned().collect(),
        }
    }

    fn into_question(self) -> Result<Question, quiz_core::Error> {
        let options = self
            .options
            .into_iter()
            .map(|option| AnswerOption::new(option.answer))
            .collect();
        Ok(Question::new(self.question, options, self.answer)?)
    }
}

/// Body of a quiz-record submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRecordPayload {
    pub user_id: String,
    pub quiz_id: String,
    pub category_id: String,
    pub category_name: String,
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub attempts: u32,
    pub accuracy: f64,
}

impl QuizRecordPayload {
    #[must_use]
    pub fn from_submission(submission: &QuizRecordSubmission) -> Self {
        let record = &submission.record;
        Self {
            user_id: submission.user_id.as_str().to_owned(),
            quiz_id: submission.quiz_id.as_str().to_owned(),
            category_id: submission.category_id.as_str().to_owned(),
            category_name: submission.category_name.clone(),
            score: record.score(),
            total_questions: record.total_questions(),
            correct_answers: record.correct_answers(),
            incorrect_answers: record.incorrect_answers(),
            attempts: record.attempts(),
            accuracy: record.accuracy(),
        }
    }
}

/// Body of an issue submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePayload {
    pub title: String,
    pub description: String,
    pub quiz_id: String,
    pub category_id: String,
}

impl IssuePayload {
    #[must_use]
    pub fn from_report(report: &IssueReport) -> Self {
        Self {
            title: report.title.clone(),
            description: report.description.clone(),
            quiz_id: report.quiz_id.as_str().to_owned(),
            category_id: report.category_id.as_str().to_owned(),
        }
    }
}
