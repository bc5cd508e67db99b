pub mod get_job_status;
pub mod queue_query_job;

pub use get_job_status::GetJobStatusUseCase;
pub use queue_query_job::QueueQueryJobUseCase;
