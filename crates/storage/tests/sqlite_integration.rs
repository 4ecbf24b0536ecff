use quiz_core::model::{
    AnswerOption, Category, CategoryId, IssueReport, Question, QuizId, QuizRecord,
    QuizRecordSubmission, QuizTopic, UserId,
};
use storage::repository::{
    IssueHistory, IssueSink, QuizCatalog, QuizCatalogWriter, QuizRecordSink, RecordHistory,
    StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn rust_topic(info: &str) -> QuizTopic {
    let question = Question::new(
        "Which types are Copy?",
        vec![
            AnswerOption::from("i32"),
            AnswerOption::from("String"),
            AnswerOption::from("bool"),
        ],
        ["i32", "bool"],
    )
    .unwrap();
    let category = Category::new(
        CategoryId::new("c1"),
        "Ownership",
        "Moves and borrows",
        vec![question],
    )
    .unwrap();
    QuizTopic::new(QuizId::new("rust"), "Rust", info, None, vec![category]).unwrap()
}

fn submission(user: &str, correct: u32) -> QuizRecordSubmission {
    QuizRecordSubmission {
        user_id: UserId::new(user),
        quiz_id: QuizId::new("rust"),
        category_id: CategoryId::new("c1"),
        category_name: "Ownership".into(),
        record: QuizRecord::from_persisted(
            correct,
            3,
            correct,
            3 - correct,
            f64::from(correct) / 3.0 * 100.0,
            1,
        ),
    }
}

#[tokio::test]
async fn sqlite_catalog_roundtrip_and_upsert() {
    let repo = connect("memdb_catalog").await;

    repo.upsert_quiz(&rust_topic("v1")).await.unwrap();
    repo.upsert_quiz(&rust_topic("v2")).await.unwrap();

    let fetched = repo.fetch_quiz_by_topic(&QuizId::new("rust")).await.unwrap();
    assert_eq!(fetched.info(), "v2");
    assert_eq!(fetched, rust_topic("v2"));

    let all = repo.list_quizzes().await.unwrap();
    assert_eq!(all.len(), 1);

    let missing = repo.fetch_quiz_by_topic(&QuizId::new("go")).await;
    assert!(matches!(missing, Err(StorageError::NotFound)));
}

#[tokio::test]
async fn sqlite_records_are_listed_newest_first() {
    let repo = connect("memdb_records").await;

    repo.submit_record(&submission("u1", 1)).await.unwrap();
    repo.submit_record(&submission("u2", 3)).await.unwrap();
    repo.submit_record(&submission("u1", 2)).await.unwrap();

    let records = repo
        .list_records_for_user(&UserId::new("u1"), 10)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].record.correct_answers(), 2);
    assert_eq!(records[0].record.incorrect_answers(), 1);
    assert_eq!(records[1].record.correct_answers(), 1);
    assert_eq!(records[0].category_name, "Ownership");
}

#[tokio::test]
async fn sqlite_issues_are_scoped_to_quiz() {
    let repo = connect("memdb_issues").await;

    let report = IssueReport {
        title: "Wrong key".into(),
        description: "String is not Copy".into(),
        quiz_id: QuizId::new("rust"),
        category_id: CategoryId::new("c1"),
    };
    repo.submit_issue(&report).await.unwrap();

    let issues = repo.list_issues_for_quiz(&QuizId::new("rust")).await.unwrap();
    assert_eq!(issues, vec![report]);
    assert!(
        repo.list_issues_for_quiz(&QuizId::new("go"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}
