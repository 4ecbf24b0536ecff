//! Line-based terminal presentation of session snapshots.

use std::fmt::Write as _;

use services::sessions::{IssueStatus, PhaseKind, SessionSnapshot};

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Start the category at this zero-based position.
    Start(usize),
    /// Toggle options of the current question by zero-based position.
    Toggle(Vec<usize>),
    Next,
    Previous,
    Back,
    Reset,
    OpenReport,
    CancelReport,
    Submit { title: String, description: String },
    Help,
    Quit,
}

/// Interpret `line` for the given phase. `None` means the line made no sense there.
#[must_use]
pub fn parse_input(line: &str, phase: PhaseKind) -> Option<Input> {
    let line = line.trim();
    match line {
        "q" | "quit" => return Some(Input::Quit),
        "?" | "h" | "help" => return Some(Input::Help),
        _ => {}
    }

    match phase {
        PhaseKind::SelectingCategory => parse_positions(line)
            .filter(|positions| positions.len() == 1)
            .map(|positions| Input::Start(positions[0])),
        PhaseKind::InProgress => match line {
            "n" => Some(Input::Next),
            "p" => Some(Input::Previous),
            "b" => Some(Input::Back),
            _ => parse_positions(line).map(Input::Toggle),
        },
        PhaseKind::Complete => match line {
            "r" => Some(Input::Reset),
            "i" => Some(Input::OpenReport),
            _ => None,
        },
        PhaseKind::ReportingIssue => match line {
            "c" => Some(Input::CancelReport),
            "" => None,
            _ => {
                let (title, description) = line.split_once('|').unwrap_or((line, ""));
                Some(Input::Submit {
                    title: title.trim().to_owned(),
                    description: description.trim().to_owned(),
                })
            }
        },
    }
}

/// One-based numbers separated by spaces or commas, returned zero-based.
fn parse_positions(line: &str) -> Option<Vec<usize>> {
    let positions = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<usize>().ok()?.checked_sub(1))
        .collect::<Option<Vec<_>>>()?;
    (!positions.is_empty()).then_some(positions)
}

#[must_use]
pub fn help(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::SelectingCategory => "pick a category by number, or q to quit",
        PhaseKind::InProgress => {
            "toggle options by number (e.g. `1 3`), n next, p previous, b back to categories, q quit"
        }
        PhaseKind::Complete => "r choose another category, i report an issue, q quit",
        PhaseKind::ReportingIssue => "type `title | description` to submit, c to cancel",
    }
}

/// What must change for the screen to be redrawn. Countdown ticks alone do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    phase: PhaseKind,
    question: Option<(usize, Vec<bool>)>,
    issue_status: Option<IssueStatus>,
    issue_submitting: bool,
}

impl Screen {
    #[must_use]
    pub fn of(snapshot: &SessionSnapshot) -> Self {
        Self {
            phase: snapshot.phase,
            question: snapshot.question.as_ref().map(|question| {
                (
                    question.index,
                    question.options.iter().map(|option| option.selected).collect(),
                )
            }),
            issue_status: snapshot.issue_status,
            issue_submitting: snapshot
                .results
                .as_ref()
                .is_some_and(|results| results.issue_submitting),
        }
    }
}

#[must_use]
pub fn render(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    match snapshot.phase {
        PhaseKind::SelectingCategory => {
            let _ = writeln!(out, "\n== {} ==", snapshot.topic);
            for (position, category) in snapshot.categories.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {}. {} ({} questions) {}",
                    position + 1,
                    category.name,
                    category.question_count,
                    category.description
                );
            }
        }
        PhaseKind::InProgress => {
            if let Some(question) = &snapshot.question {
                let _ = writeln!(
                    out,
                    "\n[{}] Question {} of {}  ({}s)",
                    question.category_name,
                    question.index + 1,
                    question.total,
                    question.remaining_secs
                );
                let _ = writeln!(out, "{}", question.text);
                for (position, option) in question.options.iter().enumerate() {
                    let mark = if option.selected { 'x' } else { ' ' };
                    let _ = writeln!(out, "  [{mark}] {}. {}", position + 1, option.text);
                }
            }
        }
        PhaseKind::Complete | PhaseKind::ReportingIssue => {
            if let Some(results) = &snapshot.results {
                let record = &results.record;
                let _ = writeln!(out, "\n== {} ==", results.leaderboard_key);
                let _ = writeln!(
                    out,
                    "Score {} (nominal max {}), {} correct, {} incorrect, accuracy {:.2}%",
                    record.score(),
                    results.nominal_max_score,
                    record.correct_answers(),
                    record.incorrect_answers(),
                    record.accuracy()
                );
                for (position, review) in results.reviews.iter().enumerate() {
                    let verdict = if review.fully_correct { "ok" } else { "--" };
                    let _ = writeln!(out, "{verdict} {}. {}", position + 1, review.question);
                    for option in &review.options {
                        let mark = match (option.selected, option.correct) {
                            (true, true) => "+",
                            (true, false) => "x",
                            (false, true) => "*",
                            (false, false) => " ",
                        };
                        let _ = writeln!(out, "     {mark} {}", option.text);
                    }
                }
                if results.issue_submitting {
                    let _ = writeln!(out, "Submitting issue...");
                } else if snapshot.phase == PhaseKind::ReportingIssue {
                    let _ = writeln!(out, "Report an issue: `title | description`, c to cancel");
                }
            }
        }
    }
    if let Some(status) = snapshot.issue_status {
        let _ = writeln!(out, "{}", status.message());
    }
    out
}
