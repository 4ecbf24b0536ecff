//! Best-effort hand-off of completed quiz records.
//!
//! The session never waits on delivery and never hears about failures; a
//! delivery strategy only decides how hard to try before logging and giving up.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::QuizRecordSubmission;
use storage::repository::{QuizRecordSink, StorageError};

use crate::config::DeliveryMode;

/// Outcome of a delivery, reported to logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Dropped { attempts: u32 },
}

#[async_trait]
pub trait RecordDelivery: Send + Sync {
    async fn deliver(&self, submission: QuizRecordSubmission) -> DeliveryOutcome;
}

/// One attempt. Failures are logged and the record is lost.
#[derive(Clone)]
pub struct FireAndForget {
    sink: Arc<dyn QuizRecordSink>,
}

impl FireAndForget {
    #[must_use]
    pub fn new(sink: Arc<dyn QuizRecordSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl RecordDelivery for FireAndForget {
    async fn deliver(&self, submission: QuizRecordSubmission) -> DeliveryOutcome {
        match self.sink.submit_record(&submission).await {
            Ok(()) => {
                log_delivered(&submission, 1);
                DeliveryOutcome::Delivered { attempts: 1 }
            }
            Err(err) => {
                log_dropped(&submission, 1, &err);
                DeliveryOutcome::Dropped { attempts: 1 }
            }
        }
    }
}

/// Up to `attempts` tries with a fixed pause. Only connection failures are
/// retried; `NotFound`, `Rejected` and `Serialization` errors are final.
#[derive(Clone)]
pub struct BoundedRetry {
    sink: Arc<dyn QuizRecordSink>,
    attempts: u32,
    backoff: Duration,
}

impl BoundedRetry {
    #[must_use]
    pub fn new(sink: Arc<dyn QuizRecordSink>, attempts: u32, backoff: Duration) -> Self {
        Self {
            sink,
            attempts: attempts.max(1),
            backoff,
        }
    }
}

#[async_trait]
impl RecordDelivery for BoundedRetry {
    async fn deliver(&self, submission: QuizRecordSubmission) -> DeliveryOutcome {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.sink.submit_record(&submission).await {
                Ok(()) => {
                    log_delivered(&submission, attempt);
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(err) if attempt < self.attempts && is_transient(&err) => {
                    tracing::debug!(attempt, error = %err, "quiz record delivery failed; retrying");
                    tokio::time::sleep(self.backoff).await;
                }
                Err(err) => {
                    log_dropped(&submission, attempt, &err);
                    return DeliveryOutcome::Dropped { attempts: attempt };
                }
            }
        }
    }
}

/// Build the delivery strategy selected in configuration.
#[must_use]
pub fn delivery_for(mode: DeliveryMode, sink: Arc<dyn QuizRecordSink>) -> Arc<dyn RecordDelivery> {
    match mode {
        DeliveryMode::FireAndForget => Arc::new(FireAndForget::new(sink)),
        DeliveryMode::Retry {
            attempts,
            backoff_ms,
        } => Arc::new(BoundedRetry::new(
            sink,
            attempts,
            Duration::from_millis(backoff_ms),
        )),
    }
}

fn is_transient(err: &StorageError) -> bool {
    matches!(err, StorageError::Connection(_))
}

fn log_delivered(submission: &QuizRecordSubmission, attempts: u32) {
    tracing::info!(
        quiz_id = %submission.quiz_id,
        category_id = %submission.category_id,
        score = submission.record.score(),
        attempts,
        "quiz record delivered"
    );
}

fn log_dropped(submission: &QuizRecordSubmission, attempts: u32, err: &StorageError) {
    tracing::warn!(
        quiz_id = %submission.quiz_id,
        category_id = %submission.category_id,
        attempts,
        error = %err,
        "quiz record delivery failed; record dropped"
    );
}
