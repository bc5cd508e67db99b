use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::QueryJob;
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};
use crate::infrastructure::database::connection::{DbConnection, DbPool};
use crate::infrastructure::database::models::{
    CompleteQueryJobModel, NewQueryJobModel, QueryJobModel,
};
use crate::infrastructure::database::schema::query_jobs;

pub struct PostgresJobRepository {
    pool: DbPool,
}

impl PostgresJobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, JobRepositoryError> {
        self.pool.get().map_err(|e| {
            JobRepositoryError::DatabaseError(format!("Failed to get database connection: {}", e))
        })
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn save(&self, job: &QueryJob) -> Result<(), JobRepositoryError> {
        let new_job = NewQueryJobModel::from(job);
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(query_jobs::table)
                .values(&new_job)
                .execute(&mut conn)
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to save job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<QueryJob>, JobRepositoryError> {
        let mut conn = self.get_connection()?;

        let result = tokio::task::spawn_blocking(move || {
            query_jobs::table
                .filter(query_jobs::id.eq(job_id))
                .select(QueryJobModel::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to find job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        result
            .map(|model| {
                QueryJob::try_from(model).map_err(|e| {
                    JobRepositoryError::DatabaseError(format!("Failed to convert job model: {}", e))
                })
            })
            .transpose()
    }

    async fn complete(&self, job: &QueryJob) -> Result<(), JobRepositoryError> {
        if !job.status().is_terminal() {
            return Err(JobRepositoryError::ValidationError(format!(
                "Job {} has no result to store",
                job.id()
            )));
        }

        let changes = CompleteQueryJobModel::from(job);
        let job_id = job.id();
        let mut conn = self.get_connection()?;

        // Only a pending row may be completed; the status guard makes the write set-once.
        let updated = tokio::task::spawn_blocking(move || {
            diesel::update(
                query_jobs::table
                    .filter(query_jobs::id.eq(job_id))
                    .filter(query_jobs::status.eq("pending")),
            )
            .set(&changes)
            .execute(&mut conn)
            .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to complete job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        if updated == 0 {
            return match self.find_by_id(job_id).await? {
                Some(_) => Err(JobRepositoryError::AlreadyCompleted(job_id)),
                None => Err(JobRepositoryError::NotFound(job_id)),
            };
        }

        Ok(())
    }

    async fn count_active_jobs(&self) -> Result<i64, JobRepositoryError> {
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            query_jobs::table
                .filter(query_jobs::status.eq("pending"))
                .count()
                .get_result(&mut conn)
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to count jobs: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))?
    }

    async fn find_pending(&self) -> Result<Vec<QueryJob>, JobRepositoryError> {
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            query_jobs::table
                .filter(query_jobs::status.eq("pending"))
                .order(query_jobs::created_at.asc())
                .select(QueryJobModel::as_select())
                .load(&mut conn)
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to load jobs: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        models
            .into_iter()
            .map(|model| {
                QueryJob::try_from(model).map_err(|e| {
                    JobRepositoryError::DatabaseError(format!("Failed to convert job model: {}", e))
                })
            })
            .collect()
    }
}
