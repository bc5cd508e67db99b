use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::QueryJob;
use crate::domain::value_objects::JobStatus;
use crate::infrastructure::database::schema::query_jobs;

#[derive(Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name = query_jobs)]
#[diesel(primary_key(id))]
pub struct QueryJobModel {
    pub id: Uuid,
    pub query: String,
    pub status: String,
    pub result: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = query_jobs)]
pub struct NewQueryJobModel {
    pub id: Uuid,
    pub query: String,
    pub status: String,
    pub result: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = query_jobs)]
pub struct CompleteQueryJobModel {
    pub status: String,
    pub result: Option<String>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&QueryJob> for NewQueryJobModel {
    fn from(job: &QueryJob) -> Self {
        Self {
            id: job.id(),
            query: job.query().to_string(),
            status: job.status().as_str().to_string(),
            result: job.result().map(str::to_string),
            error_message: job.error_message().map(str::to_string),
            created_at: job.created_at(),
            completed_at: job.completed_at(),
        }
    }
}

impl From<&QueryJob> for CompleteQueryJobModel {
    fn from(job: &QueryJob) -> Self {
        Self {
            status: job.status().as_str().to_string(),
            result: job.result().map(str::to_string),
            error_message: job.error_message().map(str::to_string),
            completed_at: job.completed_at(),
        }
    }
}

impl TryFrom<QueryJobModel> for QueryJob {
    type Error = String;

    fn try_from(model: QueryJobModel) -> Result<Self, Self::Error> {
        let status = JobStatus::from_parts(&model.status, model.error_message.as_deref())?;

        Ok(QueryJob::from_database(
            model.id,
            model.query,
            status,
            model.result,
            model.created_at,
            model.completed_at,
        ))
    }
}
