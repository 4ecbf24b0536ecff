use chrono::{DateTime, Utc};
use rand::Rng;

use quiz_core::countdown::{Countdown, Tick};
use quiz_core::model::{
    AnswerSheet, CategoryId, CompletedAttempt, IssueDraft, IssueReport, Question, QuizRecord,
    QuizTopic,
};
use quiz_core::scoring;
use quiz_core::shuffle::shuffled;
use quiz_core::Clock;

use super::view::{
    CategorySummary, IssueStatus, OptionView, PhaseKind, QuestionView, ResultsView,
    SessionSnapshot, leaderboard_key, nominal_max_score,
};
use crate::error::SessionError;

//
// ─── TRANSITION RESULTS ────────────────────────────────────────────────────────
//

/// What a controller operation changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Nothing changed (boundary no-op, stale tick, wrong phase for a lenient op).
    Ignored,
    /// State changed without moving to another question.
    Updated,
    /// The countdown moved; carries the remaining units.
    Ticked { remaining: u32 },
    /// A different question is current and its countdown restarted.
    QuestionChanged { index: usize },
    /// The session just completed; the attempt is ready for delivery.
    Completed(CompletedAttempt),
}

//
// ─── INTERNAL PHASES ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IssueOverlay {
    Closed,
    Open,
    Submitting,
}

#[derive(Debug, Clone)]
struct ActiveQuiz {
    category_id: CategoryId,
    category_name: String,
    questions: Vec<Question>,
    current: usize,
    answers: AnswerSheet,
    countdown: Countdown,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CompletedQuiz {
    category_id: CategoryId,
    category_name: String,
    questions: Vec<Question>,
    answers: AnswerSheet,
    record: QuizRecord,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    issue: IssueOverlay,
    status: Option<IssueStatus>,
}

#[derive(Debug, Clone)]
enum Phase {
    SelectingCategory,
    InProgress(ActiveQuiz),
    Complete(CompletedQuiz),
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Synchronous state machine for one quiz topic.
///
/// The controller never sleeps. Whoever drives it delivers ticks tagged with
/// [`SessionController::timer_epoch`]; the epoch changes whenever a question
/// becomes current or the timer goes inert, so ticks scheduled for an earlier
/// question are ignored.
#[derive(Debug, Clone)]
pub struct SessionController {
    quiz: QuizTopic,
    clock: Clock,
    question_seconds: u32,
    phase: Phase,
    timer_epoch: u64,
}

impl SessionController {
    #[must_use]
    pub fn new(quiz: QuizTopic, clock: Clock, question_seconds: u32) -> Self {
        Self {
            quiz,
            clock,
            question_seconds,
            phase: Phase::SelectingCategory,
            timer_epoch: 0,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizTopic {
        &self.quiz
    }

    #[must_use]
    pub fn phase_kind(&self) -> PhaseKind {
        match &self.phase {
            Phase::SelectingCategory => PhaseKind::SelectingCategory,
            Phase::InProgress(_) => PhaseKind::InProgress,
            Phase::Complete(done) if done.issue == IssueOverlay::Closed => PhaseKind::Complete,
            Phase::Complete(_) => PhaseKind::ReportingIssue,
        }
    }

    /// Epoch of the running countdown, or `None` while the timer is inert.
    #[must_use]
    pub fn timer_epoch(&self) -> Option<u64> {
        match self.phase {
            Phase::InProgress(_) => Some(self.timer_epoch),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match &self.phase {
            Phase::InProgress(active) => Some(active.current),
            _ => None,
        }
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        match &self.phase {
            Phase::InProgress(active) => Some(active.countdown.remaining()),
            _ => None,
        }
    }

    #[must_use]
    pub fn issue_status(&self) -> Option<IssueStatus> {
        match &self.phase {
            Phase::Complete(done) => done.status,
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase_kind(),
        }
    }

    // ─── Category selection ────────────────────────────────────────────────────

    /// Start a quiz on `category_id` with thread-local randomness.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside category selection and
    /// `SessionError::UnknownCategory` if the topic has no such category.
    pub fn start_quiz(&mut self, category_id: &CategoryId) -> Result<Step, SessionError> {
        self.start_quiz_with_rng(category_id, &mut rand::rng())
    }

    /// Start a quiz, shuffling questions and then each question's options with `rng`.
    ///
    /// An empty category completes immediately with a zero-question record.
    ///
    /// # Errors
    ///
    /// Same as [`SessionController::start_quiz`].
    pub fn start_quiz_with_rng<R: Rng + ?Sized>(
        &mut self,
        category_id: &CategoryId,
        rng: &mut R,
    ) -> Result<Step, SessionError> {
        if !matches!(self.phase, Phase::SelectingCategory) {
            return Err(self.invalid("start a quiz"));
        }
        let category = self
            .quiz
            .category(category_id)
            .ok_or_else(|| SessionError::UnknownCategory(category_id.to_string()))?;

        let questions: Vec<Question> = shuffled(category.questions(), rng)
            .into_iter()
            .map(|question| question.with_shuffled_options(rng))
            .collect();

        let active = ActiveQuiz {
            category_id: category.id().clone(),
            category_name: category.name().to_owned(),
            questions,
            current: 0,
            answers: AnswerSheet::new(),
            countdown: Countdown::new(self.question_seconds),
            started_at: self.clock.now(),
        };
        tracing::debug!(
            quiz_id = %self.quiz.id(),
            category_id = %active.category_id,
            questions = active.questions.len(),
            "quiz started"
        );

        if active.questions.is_empty() {
            return Ok(self.complete(active));
        }
        self.phase = Phase::InProgress(active);
        self.timer_epoch += 1;
        Ok(Step::QuestionChanged { index: 0 })
    }

    // ─── In progress ───────────────────────────────────────────────────────────

    /// Move forward, or complete the session from the last question.
    pub fn next(&mut self) -> Step {
        let Phase::InProgress(active) = &mut self.phase else {
            return Step::Ignored;
        };
        if active.current + 1 < active.questions.len() {
            active.current += 1;
            active.countdown.restart();
            let index = active.current;
            self.timer_epoch += 1;
            return Step::QuestionChanged { index };
        }
        self.finish()
    }

    /// Move back one question. No-op at the first question.
    pub fn previous(&mut self) -> Step {
        let Phase::InProgress(active) = &mut self.phase else {
            return Step::Ignored;
        };
        if active.current == 0 {
            return Step::Ignored;
        }
        active.current -= 1;
        active.countdown.restart();
        let index = active.current;
        self.timer_epoch += 1;
        Step::QuestionChanged { index }
    }

    /// Advance the countdown by one unit. Expiry behaves exactly like [`Self::next`].
    pub fn tick(&mut self, epoch: u64) -> Step {
        if self.timer_epoch() != Some(epoch) {
            return Step::Ignored;
        }
        let Phase::InProgress(active) = &mut self.phase else {
            return Step::Ignored;
        };
        match active.countdown.tick() {
            Tick::Running(remaining) => Step::Ticked { remaining },
            Tick::Expired => {
                tracing::debug!(index = active.current, "question timed out");
                self.next()
            }
        }
    }

    /// Toggle `option` in question `index`'s selection. The timer is unaffected.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` when no quiz is running,
    /// `SessionError::QuestionOutOfRange` for a bad index and
    /// `SessionError::UnknownOption` if the question does not offer `option`.
    pub fn toggle_answer(&mut self, index: usize, option: &str) -> Result<Step, SessionError> {
        let Phase::InProgress(active) = &mut self.phase else {
            return Err(self.invalid("toggle an answer"));
        };
        let count = active.questions.len();
        let question = active
            .questions
            .get(index)
            .ok_or(SessionError::QuestionOutOfRange { index, count })?;
        if !question.has_option(option) {
            return Err(SessionError::UnknownOption(option.to_owned()));
        }
        active.answers.toggle(index, option);
        Ok(Step::Updated)
    }

    /// Leave a running quiz without a record.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` when no quiz is running.
    pub fn abandon(&mut self) -> Result<Step, SessionError> {
        if !matches!(self.phase, Phase::InProgress(_)) {
            return Err(self.invalid("abandon the quiz"));
        }
        tracing::debug!(quiz_id = %self.quiz.id(), "quiz abandoned");
        self.phase = Phase::SelectingCategory;
        self.timer_epoch += 1;
        Ok(Step::Updated)
    }

    fn finish(&mut self) -> Step {
        match std::mem::replace(&mut self.phase, Phase::SelectingCategory) {
            Phase::InProgress(active) => self.complete(active),
            other => {
                self.phase = other;
                Step::Ignored
            }
        }
    }

    fn complete(&mut self, active: ActiveQuiz) -> Step {
        let record = QuizRecord::from_score(&scoring::score(&active.questions, &active.answers));
        let attempt = CompletedAttempt {
            quiz_id: self.quiz.id().clone(),
            category_id: active.category_id.clone(),
            category_name: active.category_name.clone(),
            record,
        };
        tracing::info!(
            quiz_id = %attempt.quiz_id,
            category_id = %attempt.category_id,
            score = record.score(),
            total = record.total_questions(),
            "quiz completed"
        );

        self.phase = Phase::Complete(CompletedQuiz {
            category_id: active.category_id,
            category_name: active.category_name,
            questions: active.questions,
            answers: active.answers,
            record,
            started_at: active.started_at,
            completed_at: self.clock.now(),
            issue: IssueOverlay::Closed,
            status: None,
        });
        self.timer_epoch += 1;
        Step::Completed(attempt)
    }

    // ─── Complete ──────────────────────────────────────────────────────────────

    /// Discard the finished session and return to category selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless complete with the issue form closed.
    pub fn reset(&mut self) -> Result<Step, SessionError> {
        match &self.phase {
            Phase::Complete(done) if done.issue == IssueOverlay::Closed => {
                self.phase = Phase::SelectingCategory;
                Ok(Step::Updated)
            }
            _ => Err(self.invalid("reset")),
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless complete with the issue form closed.
    pub fn open_issue_report(&mut self) -> Result<Step, SessionError> {
        match &mut self.phase {
            Phase::Complete(done) if done.issue == IssueOverlay::Closed => {
                done.issue = IssueOverlay::Open;
                Ok(Step::Updated)
            }
            _ => Err(self.invalid("open an issue report")),
        }
    }

    /// Close the issue form. Ignored while a submission is in flight.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the form is not open.
    pub fn cancel_issue_report(&mut self) -> Result<Step, SessionError> {
        match &mut self.phase {
            Phase::Complete(done) if done.issue == IssueOverlay::Open => {
                done.issue = IssueOverlay::Closed;
                Ok(Step::Updated)
            }
            Phase::Complete(done) if done.issue == IssueOverlay::Submitting => Ok(Step::Ignored),
            _ => Err(self.invalid("cancel an issue report")),
        }
    }

    /// Validate `draft` and mark the form as submitting.
    ///
    /// The caller sends the returned report and then calls
    /// [`Self::settle_issue_submission`]. An invalid draft leaves the form open.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the form is not open and
    /// `SessionError::Issue` if the title or description is blank.
    pub fn begin_issue_submission(&mut self, draft: IssueDraft) -> Result<IssueReport, SessionError> {
        let quiz_id = self.quiz.id().clone();
        match &mut self.phase {
            Phase::Complete(done) if done.issue == IssueOverlay::Open => {
                let report = draft.validate(quiz_id, done.category_id.clone())?;
                done.issue = IssueOverlay::Submitting;
                Ok(report)
            }
            _ => Err(self.invalid("submit an issue report")),
        }
    }

    /// Close the form after a submission settles and show the matching status.
    ///
    /// Success and failure close the form the same way; only the message differs.
    pub fn settle_issue_submission(&mut self, delivered: bool) -> Step {
        match &mut self.phase {
            Phase::Complete(done) if done.issue == IssueOverlay::Submitting => {
                done.issue = IssueOverlay::Closed;
                done.status = Some(if delivered {
                    IssueStatus::Submitted
                } else {
                    IssueStatus::Failed
                });
                Step::Updated
            }
            _ => Step::Ignored,
        }
    }

    pub fn clear_issue_status(&mut self) -> Step {
        match &mut self.phase {
            Phase::Complete(done) if done.status.is_some() => {
                done.status = None;
                Step::Updated
            }
            _ => Step::Ignored,
        }
    }

    // ─── Presentation ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            quiz_id: self.quiz.id().clone(),
            topic: self.quiz.topic().to_owned(),
            phase: self.phase_kind(),
            categories: self
                .quiz
                .categories()
                .iter()
                .map(|category| CategorySummary {
                    id: category.id().clone(),
                    name: category.name().to_owned(),
                    description: category.description().to_owned(),
                    question_count: category.question_count(),
                })
                .collect(),
            question: self.question_view(),
            results: self.results_view(),
            issue_status: self.issue_status(),
        }
    }

    fn question_view(&self) -> Option<QuestionView> {
        let Phase::InProgress(active) = &self.phase else {
            return None;
        };
        let question = active.questions.get(active.current)?;
        Some(QuestionView {
            category_name: active.category_name.clone(),
            index: active.current,
            total: active.questions.len(),
            text: question.text().to_owned(),
            options: question
                .options()
                .iter()
                .map(|option| OptionView {
                    text: option.text().to_owned(),
                    selected: active.answers.is_selected(active.current, option.text()),
                })
                .collect(),
            remaining_secs: active.countdown.remaining(),
            duration_secs: active.countdown.duration(),
        })
    }

    fn results_view(&self) -> Option<ResultsView> {
        let Phase::Complete(done) = &self.phase else {
            return None;
        };
        Some(ResultsView {
            category_id: done.category_id.clone(),
            category_name: done.category_name.clone(),
            record: done.record,
            reviews: scoring::review(&done.questions, &done.answers),
            nominal_max_score: nominal_max_score(done.questions.len()),
            leaderboard_key: leaderboard_key(self.quiz.topic(), &done.category_name),
            started_at: done.started_at,
            completed_at: done.completed_at,
            issue_form_open: done.issue != IssueOverlay::Closed,
            issue_submitting: done.issue == IssueOverlay::Submitting,
        })
    }
}
