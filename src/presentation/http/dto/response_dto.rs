use serde::Serialize;

/// Envelope used for error responses and the health endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(code: String, message: String, details: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message,
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponseDto {
    pub status: String,
    pub version: String,
    pub queue: QueueHealthDto,
}

#[derive(Debug, Serialize)]
pub struct QueueHealthDto {
    pub queue_size: usize,
    pub active_jobs: i64,
    pub total_enqueued: u64,
    pub total_dequeued: u64,
    pub is_healthy: bool,
    pub last_activity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponseDto {
    pub msg: String,
}

impl MessageResponseDto {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}
