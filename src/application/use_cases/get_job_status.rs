use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::QueryJob;
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};

#[derive(Debug)]
pub enum GetJobStatusError {
    RepositoryError(String),
}

impl std::fmt::Display for GetJobStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetJobStatusError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for GetJobStatusError {}

impl From<JobRepositoryError> for GetJobStatusError {
    fn from(error: JobRepositoryError) -> Self {
        GetJobStatusError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct GetJobStatusRequest {
    pub job_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct GetJobStatusResponse {
    pub job: QueryJob,
}

pub struct GetJobStatusUseCase {
    job_repository: Arc<dyn JobRepository>,
}

impl GetJobStatusUseCase {
    pub fn new(job_repository: Arc<dyn JobRepository>) -> Self {
        Self { job_repository }
    }

    /// `Ok(None)` for ids that were never issued; unknown ids are not an error.
    pub async fn execute(
        &self,
        request: GetJobStatusRequest,
    ) -> Result<Option<GetJobStatusResponse>, GetJobStatusError> {
        let job = self.job_repository.find_by_id(request.job_id).await?;

        Ok(job.map(|job| GetJobStatusResponse { job }))
    }

    pub async fn count_active_jobs(&self) -> Result<i64, GetJobStatusError> {
        self.job_repository
            .count_active_jobs()
            .await
            .map_err(GetJobStatusError::from)
    }
}
