//! HTTP client for the remote quiz collaborator.
//!
//! Routes: `GET /quiz/all-quiz`, `GET /quiz/topic/{id}`, `POST /quiz-record/add`
//! and `POST /issue/add`. Bodies use the documents from `storage::documents`.

use async_trait::async_trait;
use quiz_core::model::{IssueReport, QuizId, QuizRecordSubmission, QuizTopic};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use storage::documents::{IssuePayload, QuizDocument, QuizRecordPayload};
use storage::repository::{IssueSink, QuizCatalog, QuizRecordSink, StorageError};
use url::Url;

use crate::config::ApiConfig;
use crate::error::QuizApiError;

#[derive(Clone)]
pub struct QuizApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl QuizApiClient {
    /// Create a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `QuizApiError::Url` if the base URL does not parse.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, QuizApiError> {
        Ok(Self {
            client: Client::new(),
            base_url: Url::parse(base_url)?,
            token,
        })
    }

    /// Create a client from engine configuration.
    ///
    /// # Errors
    ///
    /// Returns `QuizApiError::Disabled` when no base URL is configured.
    pub fn from_config(config: &ApiConfig) -> Result<Self, QuizApiError> {
        let base_url = config.base_url.as_deref().ok_or(QuizApiError::Disabled)?;
        Self::new(base_url, config.token.clone())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StorageError::Connection(format!("base url cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StorageError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        check_status(response.status())?;
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, StorageError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let response = self.send(self.client.get(url)).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }
}

fn check_status(status: StatusCode) -> Result<(), StorageError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::NOT_FOUND {
        Err(StorageError::NotFound)
    } else {
        Err(StorageError::Rejected {
            status: status.as_u16(),
        })
    }
}

fn into_topic(document: QuizDocument) -> Result<QuizTopic, StorageError> {
    document
        .into_topic()
        .map_err(|err| StorageError::Serialization(err.to_string()))
}

#[async_trait]
impl QuizCatalog for QuizApiClient {
    async fn list_quizzes(&self) -> Result<Vec<QuizTopic>, StorageError> {
        let documents: Vec<QuizDocument> = self.get_json(&["quiz", "all-quiz"]).await?;
        documents.into_iter().map(into_topic).collect()
    }

    async fn fetch_quiz_by_topic(&self, id: &QuizId) -> Result<QuizTopic, StorageError> {
        let document: QuizDocument = self.get_json(&["quiz", "topic", id.as_str()]).await?;
        into_topic(document)
    }
}

#[async_trait]
impl QuizRecordSink for QuizApiClient {
    async fn submit_record(&self, submission: &QuizRecordSubmission) -> Result<(), StorageError> {
        let url = self.endpoint(&["quiz-record", "add"])?;
        let payload = QuizRecordPayload::from_submission(submission);
        self.send(self.client.post(url).json(&payload)).await?;
        Ok(())
    }
}

#[async_trait]
impl IssueSink for QuizApiClient {
    async fn submit_issue(&self, report: &IssueReport) -> Result<(), StorageError> {
        let url = self.endpoint(&["issue", "add"])?;
        let payload = IssuePayload::from_report(report);
        self.send(self.client.post(url).json(&payload)).await?;
        Ok(())
    }
}
