use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{
    AnswerOption, Category, CategoryId, IssueDraft, IssueReport, Question, QuizId,
    QuizRecordSubmission, QuizTopic, UserId,
};
use quiz_core::time::fixed_now;
use services::sessions::IssueStatus;
use services::{Clock, EngineConfig, PhaseKind, QuizEngine, SessionError, StaticIdentity};
use storage::repository::{
    InMemoryRepository, IssueHistory, IssueSink, QuizRecordSink, RecordHistory, StorageError,
};
use tokio::time::sleep;

fn topic() -> QuizTopic {
    let questions = (1..=3)
        .map(|n| {
            Question::new(
                format!("Q{n}"),
                vec![
                    AnswerOption::from("right"),
                    AnswerOption::from("wrong"),
                    AnswerOption::from("other"),
                ],
                ["right"],
            )
            .unwrap()
        })
        .collect();
    let category = Category::new(CategoryId::new("c1"), "Basics", "", questions).unwrap();
    QuizTopic::new(QuizId::new("rust"), "Rust", "", None, vec![category]).unwrap()
}

fn engine(repo: &InMemoryRepository, config: EngineConfig) -> QuizEngine {
    QuizEngine::new(
        config,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(StaticIdentity::signed_in(UserId::new("u1"))),
    )
    .with_clock(Clock::fixed(fixed_now()))
}

struct OfflineIssues;

#[async_trait]
impl IssueSink for OfflineIssues {
    async fn submit_issue(&self, _: &IssueReport) -> Result<(), StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}

/// Accepts records only after a delay, like a slow network round trip.
#[derive(Default)]
struct SlowRecords {
    accepted: Mutex<Vec<QuizRecordSubmission>>,
}

#[async_trait]
impl QuizRecordSink for SlowRecords {
    async fn submit_record(&self, submission: &QuizRecordSubmission) -> Result<(), StorageError> {
        sleep(Duration::from_millis(50)).await;
        self.accepted.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn countdown_auto_advances_and_completes() {
    let repo = InMemoryRepository::with_quizzes([topic()]);
    let session = engine(&repo, EngineConfig::default())
        .launch(&QuizId::new("rust"))
        .await
        .unwrap();
    assert_eq!(session.snapshot().phase, PhaseKind::SelectingCategory);

    session.start_quiz(CategoryId::new("c1")).await.unwrap();
    let question = session.snapshot().question.unwrap();
    assert_eq!(question.index, 0);
    assert_eq!(question.remaining_secs, 15);

    sleep(Duration::from_millis(5_500)).await;
    assert_eq!(session.snapshot().question.unwrap().remaining_secs, 10);

    sleep(Duration::from_secs(10)).await;
    let question = session.snapshot().question.unwrap();
    assert_eq!(question.index, 1);
    assert_eq!(question.remaining_secs, 15);

    sleep(Duration::from_secs(30)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, PhaseKind::Complete);
    let results = snapshot.results.unwrap();
    assert_eq!(results.record.score(), 0);
    assert_eq!(results.record.total_questions(), 3);

    sleep(Duration::from_millis(100)).await;
    let records = repo
        .list_records_for_user(&UserId::new("u1"), 10)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.incorrect_answers(), 3);
}

#[tokio::test(start_paused = true)]
async fn navigation_restarts_the_countdown() {
    let repo = InMemoryRepository::with_quizzes([topic()]);
    let session = engine(&repo, EngineConfig::default())
        .launch(&QuizId::new("rust"))
        .await
        .unwrap();
    session.start_quiz(CategoryId::new("c1")).await.unwrap();

    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(session.snapshot().question.unwrap().remaining_secs, 5);

    session.next().await.unwrap();
    assert_eq!(session.snapshot().question.unwrap().remaining_secs, 15);

    // Only the fresh countdown runs: the old deadline does not fire early.
    sleep(Duration::from_millis(13_800)).await;
    let question = session.snapshot().question.unwrap();
    assert_eq!(question.index, 1);
    assert_eq!(question.remaining_secs, 2);

    session.previous().await.unwrap();
    let question = session.snapshot().question.unwrap();
    assert_eq!(question.index, 0);
    assert_eq!(question.remaining_secs, 15);

    // Previous at the first question is a no-op and keeps the countdown going.
    sleep(Duration::from_millis(2_500)).await;
    session.previous().await.unwrap();
    assert_eq!(session.snapshot().question.unwrap().remaining_secs, 13);
}

#[tokio::test(start_paused = true)]
async fn answered_quiz_is_scored_and_abandon_discards() {
    let repo = InMemoryRepository::with_quizzes([topic()]);
    let session = engine(&repo, EngineConfig::default())
        .launch(&QuizId::new("rust"))
        .await
        .unwrap();

    session.start_quiz(CategoryId::new("c1")).await.unwrap();
    session.toggle_answer(0, "right").await.unwrap();
    session.abandon().await.unwrap();
    assert_eq!(session.snapshot().phase, PhaseKind::SelectingCategory);

    session.start_quiz(CategoryId::new("c1")).await.unwrap();
    for index in 0..3 {
        session.toggle_answer(index, "right").await.unwrap();
        session.next().await.unwrap();
    }
    let results = session.snapshot().results.unwrap();
    assert_eq!(results.record.score(), 3);
    assert!((results.record.accuracy() - 100.0).abs() < f64::EPSILON);
    assert_eq!(results.leaderboard_key, "Rust - Basics");

    sleep(Duration::from_millis(100)).await;
    let records = repo
        .list_records_for_user(&UserId::new("u1"), 10)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);

    assert!(matches!(
        session.toggle_answer(0, "right").await,
        Err(SessionError::InvalidTransition {
            phase: PhaseKind::Complete,
            ..
        })
    ));
    session.reset().await.unwrap();
    assert_eq!(session.snapshot().phase, PhaseKind::SelectingCategory);
}

#[tokio::test(start_paused = true)]
async fn issue_status_is_shown_then_cleared() {
    let repo = InMemoryRepository::with_quizzes([topic()]);
    let session = engine(&repo, EngineConfig::default())
        .launch(&QuizId::new("rust"))
        .await
        .unwrap();
    session.start_quiz(CategoryId::new("c1")).await.unwrap();
    for _ in 0..3 {
        session.next().await.unwrap();
    }

    session.open_issue_report().await.unwrap();
    assert_eq!(session.snapshot().phase, PhaseKind::ReportingIssue);
    assert!(matches!(
        session.submit_issue(IssueDraft::new("", "missing title")).await,
        Err(SessionError::Issue(_))
    ));
    session
        .submit_issue(IssueDraft::new("Ambiguous", "Q2 has two right answers"))
        .await
        .unwrap();

    sleep(Duration::from_millis(500)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, PhaseKind::Complete);
    assert_eq!(snapshot.issue_status, Some(IssueStatus::Submitted));

    sleep(Duration::from_secs(2)).await;
    assert_eq!(session.snapshot().issue_status, None);

    let issues = repo.list_issues_for_quiz(&QuizId::new("rust")).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].category_id, CategoryId::new("c1"));
}

#[tokio::test(start_paused = true)]
async fn newer_issue_status_restarts_the_clear_delay() {
    let repo = InMemoryRepository::with_quizzes([topic()]);
    let session = engine(&repo, EngineConfig::default())
        .launch(&QuizId::new("rust"))
        .await
        .unwrap();
    session.start_quiz(CategoryId::new("c1")).await.unwrap();
    for _ in 0..3 {
        session.next().await.unwrap();
    }

    session.open_issue_report().await.unwrap();
    session
        .submit_issue(IssueDraft::new("Typo", "Q1"))
        .await
        .unwrap();
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(session.snapshot().issue_status, Some(IssueStatus::Submitted));

    session.open_issue_report().await.unwrap();
    session
        .submit_issue(IssueDraft::new("Typo", "Q2 as well"))
        .await
        .unwrap();

    // The first status would have cleared at 2s; the second one keeps it up.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(session.snapshot().issue_status, Some(IssueStatus::Submitted));

    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(session.snapshot().issue_status, None);

    let issues = repo.list_issues_for_quiz(&QuizId::new("rust")).await.unwrap();
    assert_eq!(issues.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_issue_closes_the_form_like_success() {
    let repo = InMemoryRepository::with_quizzes([topic()]);
    let engine = QuizEngine::new(
        EngineConfig::default(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(OfflineIssues),
        Arc::new(StaticIdentity::anonymous()),
    );
    let session = engine.launch(&QuizId::new("rust")).await.unwrap();
    session.start_quiz(CategoryId::new("c1")).await.unwrap();
    for _ in 0..3 {
        session.next().await.unwrap();
    }
    session.open_issue_report().await.unwrap();
    session
        .submit_issue(IssueDraft::new("Typo", "Q1"))
        .await
        .unwrap();

    sleep(Duration::from_millis(500)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, PhaseKind::Complete);
    assert_eq!(snapshot.issue_status, Some(IssueStatus::Failed));

    // Anonymous sessions never submit a record.
    let records = repo
        .list_records_for_user(&UserId::new("u1"), 10)
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn unknown_topic_never_starts() {
    let repo = InMemoryRepository::new();
    let result = engine(&repo, EngineConfig::default())
        .launch(&QuizId::new("missing"))
        .await;
    assert!(matches!(
        result,
        Err(SessionError::DataFetch(StorageError::NotFound))
    ));
}

#[test]
fn record_delivery_survives_shutdown() {
    let repo = InMemoryRepository::with_quizzes([topic()]);
    let records = Arc::new(SlowRecords::default());
    let engine = QuizEngine::new(
        EngineConfig::default(),
        Arc::new(repo.clone()),
        records.clone(),
        Arc::new(repo),
        Arc::new(StaticIdentity::signed_in(UserId::new("u1"))),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let settled = runtime.block_on(async {
        let session = engine.launch(&QuizId::new("rust")).await.unwrap();
        session.start_quiz(CategoryId::new("c1")).await.unwrap();
        session.toggle_answer(0, "right").await.unwrap();
        for _ in 0..3 {
            session.next().await.unwrap();
        }
        assert_eq!(session.snapshot().phase, PhaseKind::Complete);
        drop(session);
        engine.drain(Duration::from_secs(5)).await
    });
    drop(runtime);

    assert!(settled);
    let accepted = records.accepted.lock().unwrap();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].record.score(), 1);
}
