use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Pending,
    Finished,
    Failed(String),
}

impl JobStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Pending)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Finished)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, JobStatus::Failed(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed(_))
    }

    /// Jobs only ever leave `Pending`, and only once.
    pub fn can_transition_to(&self, new_status: &JobStatus) -> bool {
        matches!(
            (self, new_status),
            (JobStatus::Pending, JobStatus::Finished) | (JobStatus::Pending, JobStatus::Failed(_))
        )
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            JobStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Finished => "finished",
            // Error details live in the job's error_message column
            JobStatus::Failed(_) => "failed",
        }
    }

    pub fn from_parts(status: &str, error_message: Option<&str>) -> Result<Self, String> {
        match status.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "finished" => Ok(JobStatus::Finished),
            "failed" => Ok(JobStatus::Failed(
                error_message.unwrap_or("Unknown error").to_string(),
            )),
            other => Err(format!("Invalid job status: {}", other)),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
