use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{JobQueue, job_queue::JobQueueError};
use crate::domain::entities::QueryJob;
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};

#[derive(Debug)]
pub enum QueueQueryError {
    RepositoryError(String),
    QueueError(String),
    ValidationError(String),
}

impl std::fmt::Display for QueueQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueQueryError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            QueueQueryError::QueueError(msg) => write!(f, "Queue error: {}", msg),
            QueueQueryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for QueueQueryError {}

impl From<JobRepositoryError> for QueueQueryError {
    fn from(error: JobRepositoryError) -> Self {
        QueueQueryError::RepositoryError(error.to_string())
    }
}

impl From<JobQueueError> for QueueQueryError {
    fn from(error: JobQueueError) -> Self {
        QueueQueryError::QueueError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct QueueQueryRequest {
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct QueueQueryResponse {
    pub job_id: Uuid,
    pub status: String,
}

pub struct QueueQueryJobUseCase {
    job_repository: Arc<dyn JobRepository>,
    job_queue: Arc<dyn JobQueue>,
}

impl QueueQueryJobUseCase {
    pub fn new(job_repository: Arc<dyn JobRepository>, job_queue: Arc<dyn JobQueue>) -> Self {
        Self {
            job_repository,
            job_queue,
        }
    }

    /// Records the job as pending, hands it to the workers and returns its id
    /// without waiting for an answer.
    pub async fn execute(
        &self,
        request: QueueQueryRequest,
    ) -> Result<QueueQueryResponse, QueueQueryError> {
        if request.query.trim().is_empty() {
            return Err(QueueQueryError::ValidationError(
                "Query cannot be empty".to_string(),
            ));
        }

        let mut job = QueryJob::new(request.query);

        // Saved before enqueueing so a fast worker always finds the record
        self.job_repository.save(&job).await?;

        if let Err(error) = self.job_queue.enqueue(job.clone()).await {
            // No worker will ever see this job, so it must not stay pending
            tracing::error!("Failed to enqueue job {}: {}", job.id(), error);
            self.fail_and_store(&mut job, format!("Could not be queued: {}", error))
                .await;
            return Err(error.into());
        }

        tracing::info!("Queued query job {}", job.id());

        Ok(QueueQueryResponse {
            job_id: job.id(),
            status: "queued".to_string(),
        })
    }

    /// Fails every job still pending in the store. Run at startup, before any
    /// new job is queued: the in-process queue that held those jobs is gone.
    pub async fn fail_interrupted_jobs(&self) -> Result<usize, QueueQueryError> {
        let pending = self.job_repository.find_pending().await?;
        let count = pending.len();

        for mut job in pending {
            self.fail_and_store(&mut job, "Interrupted by a service restart".to_string())
                .await;
        }

        if count > 0 {
            tracing::warn!("Marked {} interrupted job(s) as failed", count);
        }
        Ok(count)
    }

    async fn fail_and_store(&self, job: &mut QueryJob, reason: String) {
        if let Err(e) = job.fail(reason) {
            tracing::error!("{}", e);
            return;
        }
        if let Err(e) = self.job_repository.complete(job).await {
            tracing::error!("Failed to store failure of job {}: {}", job.id(), e);
        }
    }
}
