use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use quiz_core::Clock;
use quiz_core::model::{CompletedAttempt, IssueReport, QuizId, QuizTopic};
use storage::Storage;
use storage::repository::{IssueSink, QuizCatalog, QuizRecordSink};
use tokio::task::JoinHandle;

use super::controller::SessionController;
use super::runner::{SessionHandle, SessionRunner};
use crate::config::EngineConfig;
use crate::delivery::{RecordDelivery, delivery_for};
use crate::error::SessionError;
use crate::identity::IdentityProvider;

/// Background submissions spawned by the engine and its runners.
///
/// Tasks are detached, so dropping the tracker never cancels them; it only
/// lets a caller wait for them before the runtime goes away.
#[derive(Clone, Default)]
struct InFlight {
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl InFlight {
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    fn take(&self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Wires the session controller to its collaborators.
///
/// Cheap to clone; every collaborator sits behind an `Arc`, and clones share
/// the set of in-flight submissions.
#[derive(Clone)]
pub struct QuizEngine {
    config: EngineConfig,
    clock: Clock,
    catalog: Arc<dyn QuizCatalog>,
    delivery: Arc<dyn RecordDelivery>,
    issues: Arc<dyn IssueSink>,
    identity: Arc<dyn IdentityProvider>,
    in_flight: InFlight,
}

impl QuizEngine {
    #[must_use]
    pub fn new(
        config: EngineConfig,
        catalog: Arc<dyn QuizCatalog>,
        records: Arc<dyn QuizRecordSink>,
        issues: Arc<dyn IssueSink>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let delivery = delivery_for(config.record_delivery, records);
        Self {
            config,
            clock: Clock::default(),
            catalog,
            delivery,
            issues,
            identity,
            in_flight: InFlight::default(),
        }
    }

    #[must_use]
    pub fn from_storage(
        config: EngineConfig,
        storage: &Storage,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self::new(
            config,
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.records),
            Arc::clone(&storage.issues),
            identity,
        )
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_delivery(mut self, delivery: Arc<dyn RecordDelivery>) -> Self {
        self.delivery = delivery;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// All topics offered by the catalog.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DataFetch` if the catalog cannot be read.
    pub async fn list_topics(&self) -> Result<Vec<QuizTopic>, SessionError> {
        self.catalog
            .list_quizzes()
            .await
            .map_err(SessionError::DataFetch)
    }

    /// Load a topic and build a controller in category selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DataFetch` if the topic cannot be loaded; no
    /// controller exists in that case, so no quiz can start.
    pub async fn open_topic(&self, quiz_id: &QuizId) -> Result<SessionController, SessionError> {
        let quiz = self
            .catalog
            .fetch_quiz_by_topic(quiz_id)
            .await
            .map_err(|err| {
                tracing::warn!(quiz_id = %quiz_id, error = %err, "failed to load quiz topic");
                SessionError::DataFetch(err)
            })?;
        tracing::debug!(quiz_id = %quiz_id, categories = quiz.categories().len(), "quiz topic loaded");
        Ok(SessionController::new(
            quiz,
            self.clock,
            self.config.question_seconds,
        ))
    }

    /// Load a topic and spawn a timer-driven runner for it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DataFetch` if the topic cannot be loaded.
    pub async fn launch(&self, quiz_id: &QuizId) -> Result<SessionHandle, SessionError> {
        let controller = self.open_topic(quiz_id).await?;
        Ok(SessionRunner::spawn(self.clone(), controller))
    }

    /// Hand a completed attempt to the record delivery in the background.
    ///
    /// Returns `false` without submitting when nobody is signed in.
    pub fn deliver_record(&self, attempt: CompletedAttempt) -> bool {
        let Some(user) = self.identity.current_user() else {
            tracing::warn!(
                quiz_id = %attempt.quiz_id,
                category_id = %attempt.category_id,
                "no signed-in user; quiz record not submitted"
            );
            return false;
        };
        let submission = attempt.into_submission(user.id);
        let delivery = Arc::clone(&self.delivery);
        self.in_flight.spawn(async move {
            delivery.deliver(submission).await;
        });
        true
    }

    /// Run a submission in the background, tracked for [`QuizEngine::drain`].
    pub(crate) fn spawn_submission<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.in_flight.spawn(task);
    }

    /// Wait up to `timeout` for record and issue submissions still in flight.
    ///
    /// Returns `false` if some were still running when the timeout elapsed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let settled = tokio::time::timeout(timeout, async {
            loop {
                let pending = self.in_flight.take();
                if pending.is_empty() {
                    break;
                }
                tracing::debug!(pending = pending.len(), "waiting for in-flight submissions");
                for task in pending {
                    let _ = task.await;
                }
            }
        })
        .await
        .is_ok();
        if !settled {
            tracing::warn!(?timeout, "submissions still in flight at shutdown");
        }
        settled
    }

    /// Submit an issue report. Returns whether the collaborator accepted it.
    pub async fn submit_issue(&self, report: &IssueReport) -> bool {
        match self.issues.submit_issue(report).await {
            Ok(()) => {
                tracing::info!(quiz_id = %report.quiz_id, category_id = %report.category_id, "issue submitted");
                true
            }
            Err(err) => {
                tracing::warn!(
                    quiz_id = %report.quiz_id,
                    category_id = %report.category_id,
                    error = %err,
                    "issue submission failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticIdentity;
    use crate::sessions::Step;
    use crate::delivery::DeliveryOutcome;
    use async_trait::async_trait;
    use quiz_core::model::{
        AnswerOption, Category, CategoryId, Question, QuizRecordSubmission, UserId,
    };
    use storage::repository::{InMemoryRepository, RecordHistory, StorageError};

    #[derive(Default)]
    struct CapturingDelivery {
        captured: Mutex<Vec<QuizRecordSubmission>>,
    }

    #[async_trait]
    impl RecordDelivery for CapturingDelivery {
        async fn deliver(&self, submission: QuizRecordSubmission) -> DeliveryOutcome {
            self.captured.lock().unwrap().push(submission);
            DeliveryOutcome::Delivered { attempts: 1 }
        }
    }

    fn topic() -> QuizTopic {
        let question = Question::new(
            "Q",
            vec![AnswerOption::from("yes"), AnswerOption::from("no")],
            ["yes"],
        )
        .unwrap();
        let category =
            Category::new(CategoryId::new("c1"), "Basics", "", vec![question]).unwrap();
        QuizTopic::new(QuizId::new("q1"), "Rust", "", None, vec![category]).unwrap()
    }

    fn engine(repo: &InMemoryRepository, identity: StaticIdentity) -> QuizEngine {
        QuizEngine::new(
            EngineConfig::default(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(identity),
        )
    }

    #[tokio::test]
    async fn open_topic_surfaces_fetch_failures() {
        let repo = InMemoryRepository::new();
        let engine = engine(&repo, StaticIdentity::anonymous());
        let err = engine.open_topic(&QuizId::new("missing")).await.unwrap_err();
        assert!(matches!(err, SessionError::DataFetch(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn completed_attempt_is_delivered_for_the_signed_in_user() {
        let repo = InMemoryRepository::with_quizzes([topic()]);
        let engine = engine(&repo, StaticIdentity::signed_in(UserId::new("u1")));

        let mut ctl = engine.open_topic(&QuizId::new("q1")).await.unwrap();
        ctl.start_quiz(&CategoryId::new("c1")).unwrap();
        ctl.toggle_answer(0, "yes").unwrap();
        let Step::Completed(attempt) = ctl.next() else {
            panic!("expected completion");
        };

        assert!(engine.deliver_record(attempt));
        assert!(engine.drain(Duration::from_secs(1)).await);

        let records = repo
            .list_records_for_user(&UserId::new("u1"), 5)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record.score(), 1);
        assert_eq!(records[0].category_name, "Basics");
    }

    #[tokio::test]
    async fn anonymous_attempts_are_not_submitted() {
        let repo = InMemoryRepository::with_quizzes([topic()]);
        let engine = engine(&repo, StaticIdentity::anonymous());

        let mut ctl = engine.open_topic(&QuizId::new("q1")).await.unwrap();
        ctl.start_quiz(&CategoryId::new("c1")).unwrap();
        let Step::Completed(attempt) = ctl.next() else {
            panic!("expected completion");
        };
        assert!(!engine.deliver_record(attempt));
        assert!(engine.drain(Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn substituted_delivery_receives_completed_attempts() {
        let repo = InMemoryRepository::with_quizzes([topic()]);
        let delivery = Arc::new(CapturingDelivery::default());
        let engine = engine(&repo, StaticIdentity::signed_in(UserId::new("u1")))
            .with_delivery(delivery.clone());

        let mut ctl = engine.open_topic(&QuizId::new("q1")).await.unwrap();
        ctl.start_quiz(&CategoryId::new("c1")).unwrap();
        let Step::Completed(attempt) = ctl.next() else {
            panic!("expected completion");
        };
        assert!(engine.deliver_record(attempt));
        assert!(engine.drain(Duration::from_secs(1)).await);

        let captured = delivery.captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].user_id, UserId::new("u1"));
        // The default sink was bypassed.
        let stored = repo
            .list_records_for_user(&UserId::new("u1"), 5)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }
}
