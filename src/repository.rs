use crate::analytics::{AnalysisPayload, ScoreDistribution};
use crate::config::Config;
use crate::query::ListRequest;
use crate::student::{ListPage, StudentRecord};
use thiserror::Error;

/// Normalized failure modes for the five REST operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Transport failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response without a more specific meaning.
    #[error("server error (status {status})")]
    Server { status: u16 },

    /// Create rejected: a student with the same id already exists.
    #[error("a student with this id already exists")]
    Conflict,

    /// Delete rejected: no student with the given id.
    #[error("student not found")]
    NotFound,

    /// Analysis endpoint returned zero rows.
    #[error("analysis returned no data")]
    EmptyData,
}

/// Map a non-2xx status code to the matching semantic error.
pub fn status_error(status: u16) -> RepositoryError {
    match status {
        409 => RepositoryError::Conflict,
        404 => RepositoryError::NotFound,
        _ => RepositoryError::Server { status },
    }
}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => status_error(status.as_u16()),
            None => RepositoryError::Network(err.to_string()),
        }
    }
}

/// Thin async client for the student API. Cheap to clone, so the event
/// loop can hand copies to spawned request tasks.
///
/// No operation retries automatically and no timeout is enforced beyond
/// the transport default.
#[derive(Debug, Clone)]
pub struct StudentRepository {
    http: reqwest::Client,
    base_url: String,
}

impl StudentRepository {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch one page of students. Read-only and idempotent; the query
    /// parameters come pre-assembled from the list controller.
    pub async fn list(&self, request: &ListRequest) -> Result<ListPage, RepositoryError> {
        let response = self
            .http
            .get(self.endpoint("/students/list"))
            .query(&request.params)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<ListPage>().await?)
    }

    /// Fetch and reshape the score distribution. Zero analysis rows is a
    /// user-visible condition, not a crash.
    pub async fn analysis(&self) -> Result<ScoreDistribution, RepositoryError> {
        let payload: AnalysisPayload = self
            .http
            .get(self.endpoint("/students/analysis/points"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match payload.data.first() {
            Some(row) => Ok(ScoreDistribution::from_row(row)),
            None => Err(RepositoryError::EmptyData),
        }
    }

    /// Create a new student. HTTP 409 becomes [`RepositoryError::Conflict`].
    pub async fn create(&self, record: &StudentRecord) -> Result<(), RepositoryError> {
        self.http
            .post(self.endpoint("/students/"))
            .json(record)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Full-record replace. Every field of the draft is sent; `student_id`
    /// is the immutable match key and is never altered by the call.
    pub async fn update(&self, record: &StudentRecord) -> Result<(), RepositoryError> {
        self.http
            .patch(self.endpoint("/students/"))
            .json(record)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Delete by id. Callers must have passed the confirmation gate
    /// before issuing this. HTTP 404 becomes [`RepositoryError::NotFound`].
    pub async fn delete(&self, student_id: &str) -> Result<(), RepositoryError> {
        self.http
            .delete(self.endpoint(&format!("/students/{}", student_id)))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
