use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::ports::JobQueue;
use crate::application::use_cases::GetJobStatusUseCase;
use crate::presentation::http::dto::{
    ApiResponse, HealthResponseDto, MessageResponseDto, QueueHealthDto,
};

pub struct HealthHandler {
    job_queue: Arc<dyn JobQueue>,
    get_job_status_use_case: Arc<GetJobStatusUseCase>,
}

impl HealthHandler {
    pub fn new(
        job_queue: Arc<dyn JobQueue>,
        get_job_status_use_case: Arc<GetJobStatusUseCase>,
    ) -> Self {
        Self {
            job_queue,
            get_job_status_use_case,
        }
    }

    pub async fn root() -> impl IntoResponse {
        (StatusCode::OK, Json(MessageResponseDto::new("ok")))
    }

    pub async fn health(State(handler): State<Arc<HealthHandler>>) -> impl IntoResponse {
        let queue = match handler.job_queue.health_check().await {
            Ok(queue) => queue,
            Err(e) => {
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiResponse::<HealthResponseDto>::error(
                        "QUEUE_UNAVAILABLE".to_string(),
                        e.to_string(),
                        None,
                    )),
                );
            }
        };

        let active_jobs = handler
            .get_job_status_use_case
            .count_active_jobs()
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to count active jobs: {}", e);
                -1
            });

        let status_code = if queue.is_healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        let health_response = HealthResponseDto {
            status: if queue.is_healthy { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            queue: QueueHealthDto {
                queue_size: queue.queue_size,
                active_jobs,
                total_enqueued: queue.total_enqueued,
                total_dequeued: queue.total_dequeued,
                is_healthy: queue.is_healthy,
                last_activity: queue.last_activity.map(|t| t.to_rfc3339()),
            },
        };

        (status_code, Json(ApiResponse::success(health_response)))
    }
}
