//! Timer-driven owner of a [`SessionController`].
//!
//! One task owns the controller and serializes user commands, countdown ticks
//! and the completions of spawned network requests. At most one tick deadline
//! is pending, tagged with the controller's timer epoch.

use std::time::Duration;

use quiz_core::model::{CategoryId, IssueDraft};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use super::controller::{SessionController, Step};
use super::view::SessionSnapshot;
use super::workflow::QuizEngine;
use crate::error::SessionError;

/// Length of one countdown unit.
pub const TICK: Duration = Duration::from_secs(1);

const COMMAND_BUFFER: usize = 32;

type Reply = oneshot::Sender<Result<(), SessionError>>;

enum Command {
    StartQuiz(CategoryId, Reply),
    Next(Reply),
    Previous(Reply),
    ToggleAnswer {
        index: usize,
        option: String,
        reply: Reply,
    },
    Abandon(Reply),
    Reset(Reply),
    OpenIssueReport(Reply),
    CancelIssueReport(Reply),
    SubmitIssue(IssueDraft, Reply),
}

enum Internal {
    IssueSettled { delivered: bool },
}

#[derive(Debug, Clone, Copy)]
struct ArmedTick {
    epoch: u64,
    deadline: Instant,
}

//
// ─── HANDLE ────────────────────────────────────────────────────────────────────
//

/// Client side of a running session.
///
/// Every command resolves after the resulting snapshot has been published.
/// The runner stops once all handles are dropped; record and issue
/// submissions already in flight still run to completion.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    async fn request(&self, command: impl FnOnce(Reply) -> Command) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)?
    }

    /// # Errors
    ///
    /// See [`SessionController::start_quiz`]; `SessionError::Closed` if the runner stopped.
    pub async fn start_quiz(&self, category_id: CategoryId) -> Result<(), SessionError> {
        self.request(|reply| Command::StartQuiz(category_id, reply))
            .await
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runner stopped.
    pub async fn next(&self) -> Result<(), SessionError> {
        self.request(Command::Next).await
    }

    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the runner stopped.
    pub async fn previous(&self) -> Result<(), SessionError> {
        self.request(Command::Previous).await
    }

    /// # Errors
    ///
    /// See [`SessionController::toggle_answer`].
    pub async fn toggle_answer(
        &self,
        index: usize,
        option: impl Into<String>,
    ) -> Result<(), SessionError> {
        let option = option.into();
        self.request(|reply| Command::ToggleAnswer {
            index,
            option,
            reply,
        })
        .await
    }

    /// # Errors
    ///
    /// See [`SessionController::abandon`].
    pub async fn abandon(&self) -> Result<(), SessionError> {
        self.request(Command::Abandon).await
    }

    /// # Errors
    ///
    /// See [`SessionController::reset`].
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.request(Command::Reset).await
    }

    /// # Errors
    ///
    /// See [`SessionController::open_issue_report`].
    pub async fn open_issue_report(&self) -> Result<(), SessionError> {
        self.request(Command::OpenIssueReport).await
    }

    /// # Errors
    ///
    /// See [`SessionController::cancel_issue_report`].
    pub async fn cancel_issue_report(&self) -> Result<(), SessionError> {
        self.request(Command::CancelIssueReport).await
    }

    /// Validate and send an issue report. Resolves once the request is in
    /// flight; the outcome arrives later as a transient status in the snapshot.
    ///
    /// # Errors
    ///
    /// See [`SessionController::begin_issue_submission`].
    pub async fn submit_issue(&self, draft: IssueDraft) -> Result<(), SessionError> {
        self.request(|reply| Command::SubmitIssue(draft, reply))
            .await
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

pub(crate) struct SessionRunner {
    engine: QuizEngine,
    controller: SessionController,
    commands: mpsc::Receiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    snapshots: watch::Sender<SessionSnapshot>,
    tick: Option<ArmedTick>,
    status_clear_at: Option<Instant>,
}

impl SessionRunner {
    pub(crate) fn spawn(engine: QuizEngine, controller: SessionController) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let runner = Self {
            engine,
            controller,
            commands: command_rx,
            internal_tx,
            internal_rx,
            snapshots: snapshot_tx,
            tick: None,
            status_clear_at: None,
        };
        tokio::spawn(runner.run());

        SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        }
    }

    async fn run(mut self) {
        loop {
            let tick_at = self.tick.map(|tick| tick.deadline);
            let clear_at = self.status_clear_at;

            let pending_reply = tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    Some(self.handle_command(command))
                }
                Some(event) = self.internal_rx.recv() => {
                    self.handle_internal(event);
                    None
                }
                () = sleep_or_pending(tick_at) => {
                    self.handle_tick();
                    None
                }
                () = sleep_or_pending(clear_at) => {
                    self.status_clear_at = None;
                    self.controller.clear_issue_status();
                    None
                }
            };

            self.sync_timer();
            self.snapshots.send_replace(self.controller.snapshot());
            if let Some((reply, result)) = pending_reply {
                let _ = reply.send(result);
            }
        }
        tracing::debug!(quiz_id = %self.controller.quiz().id(), "session runner stopped");
    }

    fn handle_command(&mut self, command: Command) -> (Reply, Result<(), SessionError>) {
        let ctl = &mut self.controller;
        let (reply, outcome) = match command {
            Command::StartQuiz(category_id, reply) => (reply, ctl.start_quiz(&category_id)),
            Command::Next(reply) => (reply, Ok(ctl.next())),
            Command::Previous(reply) => (reply, Ok(ctl.previous())),
            Command::ToggleAnswer {
                index,
                option,
                reply,
            } => (reply, ctl.toggle_answer(index, &option)),
            Command::Abandon(reply) => (reply, ctl.abandon()),
            Command::Reset(reply) => (reply, ctl.reset()),
            Command::OpenIssueReport(reply) => (reply, ctl.open_issue_report()),
            Command::CancelIssueReport(reply) => (reply, ctl.cancel_issue_report()),
            Command::SubmitIssue(draft, reply) => {
                let result = ctl.begin_issue_submission(draft).map(|report| {
                    let engine = self.engine.clone();
                    let internal = self.internal_tx.clone();
                    self.engine.spawn_submission(async move {
                        let delivered = engine.submit_issue(&report).await;
                        let _ = internal.send(Internal::IssueSettled { delivered });
                    });
                    Step::Updated
                });
                (reply, result)
            }
        };
        let result = outcome.map(|step| self.apply(step));
        (reply, result)
    }

    fn handle_internal(&mut self, event: Internal) {
        match event {
            Internal::IssueSettled { delivered } => {
                if self.controller.settle_issue_submission(delivered) == Step::Updated {
                    self.status_clear_at = Some(Instant::now() + self.engine.config().status_clear_delay());
                }
            }
        }
    }

    fn handle_tick(&mut self) {
        let Some(armed) = self.tick.take() else {
            return;
        };
        let step = self.controller.tick(armed.epoch);
        if let Step::Ticked { .. } = step {
            self.tick = Some(ArmedTick {
                epoch: armed.epoch,
                deadline: armed.deadline + TICK,
            });
        }
        self.apply(step);
    }

    fn apply(&mut self, step: Step) {
        if let Step::Completed(attempt) = step {
            // Detached: neither navigation nor dropping the handle cancels delivery.
            self.engine.deliver_record(attempt);
        }
    }

    /// Keep exactly one deadline for the controller's current timer epoch.
    fn sync_timer(&mut self) {
        match self.controller.timer_epoch() {
            None => self.tick = None,
            Some(epoch) if self.tick.is_some_and(|tick| tick.epoch == epoch) => {}
            Some(epoch) => {
                self.tick = Some(ArmedTick {
                    epoch,
                    deadline: Instant::now() + TICK,
                });
            }
        }
    }
}

async fn sleep_or_pending(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
