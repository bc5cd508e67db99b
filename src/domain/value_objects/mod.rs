pub mod job_status;

pub use job_status::JobStatus;
