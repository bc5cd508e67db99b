use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{
    GetJobStatusUseCase, QueueQueryJobUseCase,
    get_job_status::GetJobStatusRequest,
    queue_query_job::{QueueQueryError, QueueQueryRequest},
};
use crate::presentation::http::dto::{
    ApiResponse, ChatQueryParams, JobStatusDto, JobStatusParams, MessageResponseDto, QueuedJobDto,
};

pub struct ChatHandler {
    queue_query_use_case: Arc<QueueQueryJobUseCase>,
    get_job_status_use_case: Arc<GetJobStatusUseCase>,
}

fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error(code.to_string(), message, None)),
    )
        .into_response()
}

impl ChatHandler {
    pub fn new(
        queue_query_use_case: Arc<QueueQueryJobUseCase>,
        get_job_status_use_case: Arc<GetJobStatusUseCase>,
    ) -> Self {
        Self {
            queue_query_use_case,
            get_job_status_use_case,
        }
    }

    // Enqueue a query; never waits for the answer
    pub async fn chat(
        State(handler): State<Arc<ChatHandler>>,
        Query(params): Query<ChatQueryParams>,
    ) -> Response {
        let Some(query) = params.query else {
            return error_response(
                StatusCode::BAD_REQUEST,
                "MISSING_QUERY",
                "Query parameter `query` is required".to_string(),
            );
        };

        match handler
            .queue_query_use_case
            .execute(QueueQueryRequest { query })
            .await
        {
            Ok(response) => (StatusCode::OK, Json(QueuedJobDto::from(response))).into_response(),
            Err(QueueQueryError::ValidationError(message)) => {
                error_response(StatusCode::BAD_REQUEST, "INVALID_QUERY", message)
            }
            Err(e) => {
                tracing::error!("Failed to queue query: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "QUEUE_FAILED", e.to_string())
            }
        }
    }

    pub async fn job_status(
        State(handler): State<Arc<ChatHandler>>,
        Query(params): Query<JobStatusParams>,
    ) -> Response {
        let Some(raw_id) = params.job_id else {
            return error_response(
                StatusCode::BAD_REQUEST,
                "MISSING_JOB_ID",
                "Query parameter `job_id` is required".to_string(),
            );
        };

        let job_id = match Uuid::parse_str(raw_id.trim()) {
            Ok(job_id) => job_id,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "INVALID_JOB_ID",
                    format!("Invalid job id {:?}: {}", raw_id, e),
                );
            }
        };

        match handler
            .get_job_status_use_case
            .execute(GetJobStatusRequest { job_id })
            .await
        {
            Ok(Some(response)) => {
                (StatusCode::OK, Json(JobStatusDto::from(response))).into_response()
            }
            Ok(None) => {
                (StatusCode::OK, Json(MessageResponseDto::new("job not found"))).into_response()
            }
            Err(e) => {
                tracing::error!("Failed to fetch job {}: {}", job_id, e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "FETCH_FAILED", e.to_string())
            }
        }
    }
}
