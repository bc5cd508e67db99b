use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::JobStatus;

/// A user query waiting for (or holding) its generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryJob {
    id: Uuid,
    query: String,
    status: JobStatus,
    result: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QueryJob {
    pub fn new(query: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            query,
            status: JobStatus::Pending,
            result: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Rebuild a job from stored values (repository reconstruction).
    pub fn from_database(
        id: Uuid,
        query: String,
        status: JobStatus,
        result: Option<String>,
        created_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            query,
            status,
            result,
            created_at,
            completed_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.status.error_message()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn finish(&mut self, result: String) -> Result<(), String> {
        if !self.status.can_transition_to(&JobStatus::Finished) {
            return Err(format!("Job {} is already {}", self.id, self.status));
        }

        self.status = JobStatus::Finished;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), String> {
        let failed = JobStatus::Failed(error);
        if !self.status.can_transition_to(&failed) {
            return Err(format!("Job {} is already {}", self.id, self.status));
        }

        self.status = failed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status.is_pending()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_creation() {
        let job = QueryJob::new("What is the event loop?".to_string());

        assert_eq!(job.query(), "What is the event loop?");
        assert_eq!(job.status(), &JobStatus::Pending);
        assert!(job.result().is_none());
        assert!(job.is_active());
        assert!(job.duration().is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let first = QueryJob::new("hello".to_string());
        let second = QueryJob::new("hello".to_string());
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_finish_sets_result_once() {
        let mut job = QueryJob::new("hello".to_string());

        assert!(job.finish("🤖: hi".to_string()).is_ok());
        assert_eq!(job.status(), &JobStatus::Finished);
        assert_eq!(job.result(), Some("🤖: hi"));
        assert!(job.completed_at().is_some());

        assert!(job.finish("🤖: again".to_string()).is_err());
        assert!(job.fail("late failure".to_string()).is_err());
        assert_eq!(job.result(), Some("🤖: hi"));
        assert_eq!(job.status(), &JobStatus::Finished);
    }

    #[test]
    fn test_failure_keeps_result_empty() {
        let mut job = QueryJob::new("hello".to_string());

        assert!(job.fail("embedding backend down".to_string()).is_ok());
        assert!(job.result().is_none());
        assert_eq!(job.error_message(), Some("embedding backend down"));
        assert!(!job.is_active());
        assert!(job.finish("too late".to_string()).is_err());
    }
}
