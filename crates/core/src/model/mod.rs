mod answers;
mod category;
mod ids;
mod issue;
mod question;
mod record;

pub use ids::{CategoryId, ParseIdError, QuizId, UserId};

pub use answers::AnswerSheet;
pub use category::{Category, CategoryError, QuizTopic};
pub use issue::{IssueDraft, IssueError, IssueReport};
pub use question::{AnswerOption, Question, QuestionError};
pub use record::{CompletedAttempt, QuizRecord, QuizRecordSubmission};
