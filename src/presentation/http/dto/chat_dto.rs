use serde::{Deserialize, Serialize};

use crate::application::use_cases::{
    get_job_status::GetJobStatusResponse, queue_query_job::QueueQueryResponse,
};

#[derive(Debug, Deserialize)]
pub struct ChatQueryParams {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobStatusParams {
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueuedJobDto {
    pub status: String,
    pub job_id: String,
}

#[derive(Debug, Serialize)]
pub struct JobStatusDto {
    pub result: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<QueueQueryResponse> for QueuedJobDto {
    fn from(response: QueueQueryResponse) -> Self {
        Self {
            status: response.status,
            job_id: response.job_id.to_string(),
        }
    }
}

impl From<GetJobStatusResponse> for JobStatusDto {
    fn from(response: GetJobStatusResponse) -> Self {
        let job = response.job;
        Self {
            result: job.result().map(str::to_string),
            status: job.status().as_str().to_string(),
            error: job.error_message().map(str::to_string),
        }
    }
}
