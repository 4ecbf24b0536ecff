use chrono::{DateTime, Utc};
use quiz_core::model::{CategoryId, QuizId, QuizRecord};
use quiz_core::scoring::QuestionReview;

/// Points a question is nominally worth on the results screen.
pub const NOMINAL_POINTS_PER_QUESTION: u32 = 5;

/// Externally visible session state, including the issue overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    SelectingCategory,
    InProgress,
    Complete,
    /// Complete, with the issue form open or submitting.
    ReportingIssue,
}

/// Transient message shown after an issue submission settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    Submitted,
    Failed,
}

impl IssueStatus {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            IssueStatus::Submitted => "Issue submitted successfully!",
            IssueStatus::Failed => "Issue failed to submit!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub question_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub text: String,
    pub selected: bool,
}

/// The current question as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub category_name: String,
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<OptionView>,
    pub remaining_secs: u32,
    pub duration_secs: u32,
}

/// Results of a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub category_id: CategoryId,
    pub category_name: String,
    pub record: QuizRecord,
    pub reviews: Vec<QuestionReview>,
    /// Presentation-only maximum; the record's score is not on this scale.
    pub nominal_max_score: u32,
    pub leaderboard_key: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub issue_form_open: bool,
    pub issue_submitting: bool,
}

/// Everything a presentation layer needs to draw the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub quiz_id: QuizId,
    pub topic: String,
    pub phase: PhaseKind,
    pub categories: Vec<CategorySummary>,
    pub question: Option<QuestionView>,
    pub results: Option<ResultsView>,
    pub issue_status: Option<IssueStatus>,
}

/// Key under which a topic/category pair is ranked.
#[must_use]
pub fn leaderboard_key(topic: &str, category: &str) -> String {
    format!("{topic} - {category}")
}

#[must_use]
pub fn nominal_max_score(question_count: usize) -> u32 {
    u32::try_from(question_count)
        .unwrap_or(u32::MAX)
        .saturating_mul(NOMINAL_POINTS_PER_QUESTION)
}
