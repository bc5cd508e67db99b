use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::QueryJob;

#[derive(Debug)]
pub enum JobRepositoryError {
    NotFound(Uuid),
    AlreadyCompleted(Uuid),
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for JobRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobRepositoryError::NotFound(id) => write!(f, "Job not found: {}", id),
            JobRepositoryError::AlreadyCompleted(id) => {
                write!(f, "Job already completed: {}", id)
            }
            JobRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            JobRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for JobRepositoryError {}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn save(&self, job: &QueryJob) -> Result<(), JobRepositoryError>;

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<QueryJob>, JobRepositoryError>;

    /// Persist the terminal state of `job`. Fails with `AlreadyCompleted` when the
    /// stored record has already left the pending state.
    async fn complete(&self, job: &QueryJob) -> Result<(), JobRepositoryError>;

    async fn count_active_jobs(&self) -> Result<i64, JobRepositoryError>;

    /// Jobs still waiting for an answer, oldest first.
    async fn find_pending(&self) -> Result<Vec<QueryJob>, JobRepositoryError>;
}
