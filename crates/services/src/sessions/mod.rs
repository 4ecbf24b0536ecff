mod controller;
mod runner;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{SessionController, Step};
pub use runner::{SessionHandle, TICK};
pub use view::{
    CategorySummary, IssueStatus, NOMINAL_POINTS_PER_QUESTION, OptionView, PhaseKind,
    QuestionView, ResultsView, SessionSnapshot, leaderboard_key, nominal_max_score,
};
pub use workflow::QuizEngine;
