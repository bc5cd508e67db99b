use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::QueryJob;
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};

/// Job table kept in process memory; lost on restart.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<Uuid, QueryJob>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn save(&self, job: &QueryJob) -> Result<(), JobRepositoryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id()) {
            return Err(JobRepositoryError::ValidationError(format!(
                "Job {} already exists",
                job.id()
            )));
        }
        jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<QueryJob>, JobRepositoryError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(&job_id).cloned())
    }

    async fn complete(&self, job: &QueryJob) -> Result<(), JobRepositoryError> {
        if !job.status().is_terminal() {
            return Err(JobRepositoryError::ValidationError(format!(
                "Job {} has no result to store",
                job.id()
            )));
        }

        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .get_mut(&job.id())
            .ok_or(JobRepositoryError::NotFound(job.id()))?;

        if !stored.status().is_pending() {
            return Err(JobRepositoryError::AlreadyCompleted(job.id()));
        }

        *stored = job.clone();
        Ok(())
    }

    async fn count_active_jobs(&self) -> Result<i64, JobRepositoryError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.values().filter(|job| job.is_active()).count() as i64)
    }

    async fn find_pending(&self) -> Result<Vec<QueryJob>, JobRepositoryError> {
        let jobs = self.jobs.read().await;
        let mut pending: Vec<QueryJob> = jobs
            .values()
            .filter(|job| job.is_active())
            .cloned()
            .collect();
        pending.sort_by_key(|job| job.created_at());
        Ok(pending)
    }
}
