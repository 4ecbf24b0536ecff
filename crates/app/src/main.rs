//! Terminal front end for the quiz engine.

mod console;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use quiz_core::model::{IssueDraft, QuizId, UserId};
use services::{
    EngineConfig, IdentityProvider, QuizApiClient, QuizEngine, SessionHandle, StaticIdentity,
};
use storage::Storage;
use storage::repository::{IssueSink, QuizCatalog, QuizRecordSink, RecordHistory};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use console::{Input, Screen};

const SAMPLE_CATALOG: &str = include_str!("../data/sample_quizzes.json");

/// How long `play` waits for record and issue submissions before exiting.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Timed multiple-answer quizzes in the terminal.
#[derive(Parser, Debug)]
#[command(name = "quiz", version)]
struct Cli {
    /// Path to an engine configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database used by the local backend
    #[arg(long, global = true, env = "QUIZ_DB_URL", default_value = "sqlite:quiz.sqlite3")]
    db: String,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load quiz topics from a JSON file into the local database
    Seed {
        /// JSON array of quiz documents; the bundled sample catalog when omitted
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// List available quiz topics
    Topics {
        /// Use the remote quiz API instead of the local database
        #[arg(long)]
        api: bool,
    },
    /// Play a quiz topic
    Play {
        /// Quiz topic id
        topic: String,
        /// Signed-in user; records are only submitted when set
        #[arg(long, env = "QUIZ_USER_ID")]
        user: Option<String>,
        /// Use the remote quiz API instead of the local database
        #[arg(long)]
        api: bool,
    },
    /// Show a user's most recent quiz records from the local database
    History {
        #[arg(long, env = "QUIZ_USER_ID")]
        user: String,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    tracing::debug!(
        question_seconds = config.question_seconds,
        delivery = ?config.record_delivery,
        api = config.api.base_url.as_deref().unwrap_or("-"),
        "engine configuration"
    );

    match cli.command {
        Command::Seed { file } => {
            let raw = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => SAMPLE_CATALOG.to_owned(),
            };
            let topics = storage::seed::parse_catalog(&raw)?;
            let storage = open_storage(&cli.db).await?;
            let count = storage::seed::seed_catalog(storage.catalog_writer.as_ref(), &topics).await?;
            println!("seeded {count} quiz topics");
        }
        Command::Topics { api } => {
            let backends = Backends::open(&cli.db, api, &config).await?;
            let engine = QuizEngine::new(
                config,
                backends.catalog,
                backends.records,
                backends.issues,
                Arc::new(StaticIdentity::anonymous()),
            );
            for topic in engine.list_topics().await? {
                println!(
                    "{:<24} {} ({} categories)",
                    topic.id(),
                    topic.topic(),
                    topic.categories().len()
                );
            }
        }
        Command::Play { topic, user, api } => {
            let backends = Backends::open(&cli.db, api, &config).await?;
            let identity: Arc<dyn IdentityProvider> = match user {
                Some(id) => Arc::new(StaticIdentity::signed_in(id.parse::<UserId>()?)),
                None => Arc::new(StaticIdentity::anonymous()),
            };
            let engine = QuizEngine::new(
                config,
                backends.catalog,
                backends.records,
                backends.issues,
                identity,
            );
            let quiz_id: QuizId = topic.parse()?;
            let session = engine.launch(&quiz_id).await?;
            let played = play(session).await;
            engine.drain(SHUTDOWN_GRACE).await;
            played?;
        }
        Command::History { user, limit } => {
            let storage = open_storage(&cli.db).await?;
            let records = storage
                .record_history
                .list_records_for_user(&user.parse::<UserId>()?, limit)
                .await?;
            for entry in records {
                let record = entry.record;
                println!(
                    "{:<16} {:<20} {}/{}  {:.2}%",
                    entry.quiz_id,
                    entry.category_name,
                    record.score(),
                    record.total_questions(),
                    record.accuracy()
                );
            }
        }
    }
    Ok(())
}

struct Backends {
    catalog: Arc<dyn QuizCatalog>,
    records: Arc<dyn QuizRecordSink>,
    issues: Arc<dyn IssueSink>,
}

impl Backends {
    async fn open(db_url: &str, api: bool, config: &EngineConfig) -> anyhow::Result<Self> {
        if api {
            let client = Arc::new(QuizApiClient::from_config(&config.api)?);
            return Ok(Self {
                catalog: client.clone(),
                records: client.clone(),
                issues: client,
            });
        }
        let storage = open_storage(db_url).await?;
        Ok(Self {
            catalog: storage.catalog,
            records: storage.records,
            issues: storage.issues,
        })
    }
}

/// Open + migrate SQLite. Kept in the binary glue so the library crates stay backend-agnostic.
async fn open_storage(raw: &str) -> anyhow::Result<Storage> {
    let db_url = normalize_sqlite_url(raw);
    prepare_sqlite_file(&db_url)?;
    Storage::sqlite(&db_url)
        .await
        .with_context(|| format!("opening {db_url}"))
}

async fn play(session: SessionHandle) -> anyhow::Result<()> {
    let mut updates = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let snapshot = session.snapshot();
    let mut screen = Screen::of(&snapshot);
    print!("{}", console::render(&snapshot));
    println!("{}", console::help(snapshot.phase));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let phase = session.snapshot().phase;
                match console::parse_input(&line, phase) {
                    Some(Input::Quit) => break,
                    Some(Input::Help) | None => println!("{}", console::help(phase)),
                    Some(input) => {
                        if let Err(err) = dispatch(&session, input).await {
                            println!("! {err}");
                        }
                    }
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let next = Screen::of(&snapshot);
                if next != screen {
                    print!("{}", console::render(&snapshot));
                    screen = next;
                }
            }
        }
    }
    Ok(())
}

async fn dispatch(session: &SessionHandle, input: Input) -> anyhow::Result<()> {
    let snapshot = session.snapshot();
    match input {
        Input::Start(position) => {
            let Some(category) = snapshot.categories.get(position) else {
                bail!("no category {}", position + 1);
            };
            session.start_quiz(category.id.clone()).await?;
        }
        Input::Toggle(positions) => {
            let Some(question) = &snapshot.question else {
                bail!("no question is current");
            };
            for position in positions {
                let Some(option) = question.options.get(position) else {
                    bail!("no option {}", position + 1);
                };
                session.toggle_answer(question.index, option.text.clone()).await?;
            }
        }
        Input::Next => session.next().await?,
        Input::Previous => session.previous().await?,
        Input::Back => session.abandon().await?,
        Input::Reset => session.reset().await?,
        Input::OpenReport => session.open_issue_report().await?,
        Input::CancelReport => session.cancel_issue_report().await?,
        Input::Submit { title, description } => {
            session
                .submit_issue(IssueDraft::new(title, description))
                .await?;
        }
        Input::Help | Input::Quit => {}
    }
    Ok(())
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}
