use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use crate::application::ports::job_queue::{JobQueue, JobQueueError, QueueHealth};
use crate::domain::entities::QueryJob;

/// In-process queue between the HTTP handlers and the query workers.
pub struct MpscJobQueue {
    sender: mpsc::UnboundedSender<QueryJob>,
    stats: Arc<Mutex<QueueStats>>,
}

#[derive(Debug, Clone, Default)]
struct QueueStats {
    total_enqueued: u64,
    total_dequeued: u64,
    last_activity: Option<chrono::DateTime<chrono::Utc>>,
}

impl QueueStats {
    fn pending(&self) -> usize {
        self.total_enqueued.saturating_sub(self.total_dequeued) as usize
    }
}

impl MpscJobQueue {
    /// The sending half goes behind `Arc<dyn JobQueue>`; the receiving half is
    /// shared by the background workers.
    pub fn create_pair() -> (Self, MpscJobQueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(QueueStats::default()));

        let queue = Self {
            sender,
            stats: stats.clone(),
        };
        let receiver = MpscJobQueueReceiver {
            receiver: Mutex::new(receiver),
            stats,
        };

        (queue, receiver)
    }
}

#[async_trait]
impl JobQueue for MpscJobQueue {
    async fn enqueue(&self, job: QueryJob) -> Result<(), JobQueueError> {
        if !job.status().is_pending() {
            return Err(JobQueueError::InvalidJob(format!(
                "Job {} is already {}",
                job.id(),
                job.status()
            )));
        }

        // Counted before sending so a worker never dequeues more than was enqueued
        let mut stats = self.stats.lock().await;
        self.sender
            .send(job)
            .map_err(|_| JobQueueError::ConnectionError("Channel closed".to_string()))?;
        stats.total_enqueued += 1;
        stats.last_activity = Some(chrono::Utc::now());

        Ok(())
    }

    async fn health_check(&self) -> Result<QueueHealth, JobQueueError> {
        let stats = self.stats.lock().await;

        Ok(QueueHealth {
            queue_size: stats.pending(),
            total_enqueued: stats.total_enqueued,
            total_dequeued: stats.total_dequeued,
            is_healthy: !self.sender.is_closed(),
            last_activity: stats.last_activity,
        })
    }
}

pub struct MpscJobQueueReceiver {
    receiver: Mutex<mpsc::UnboundedReceiver<QueryJob>>,
    stats: Arc<Mutex<QueueStats>>,
}

impl MpscJobQueueReceiver {
    /// Next job, or `None` once every sender is gone and the channel is drained.
    pub async fn recv(&self) -> Option<QueryJob> {
        let job = {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        }?;

        let mut stats = self.stats.lock().await;
        stats.total_dequeued += 1;
        stats.last_activity = Some(chrono::Utc::now());

        Some(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_and_receive_in_order() {
        let (queue, receiver) = MpscJobQueue::create_pair();
        let first = QueryJob::new("first".to_string());
        let second = QueryJob::new("second".to_string());

        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();
        assert_eq!(queue.health_check().await.unwrap().queue_size, 2);

        assert_eq!(receiver.recv().await.unwrap().id(), first.id());
        assert_eq!(receiver.recv().await.unwrap().id(), second.id());

        let health = queue.health_check().await.unwrap();
        assert_eq!(health.queue_size, 0);
        assert_eq!(health.total_enqueued, 2);
        assert_eq!(health.total_dequeued, 2);
        assert!(health.is_healthy);
        assert!(health.last_activity.is_some());
    }

    #[tokio::test]
    async fn test_completed_job_is_rejected() {
        let (queue, _receiver) = MpscJobQueue::create_pair();
        let mut job = QueryJob::new("hello".to_string());
        job.finish("done".to_string()).unwrap();

        assert!(matches!(
            queue.enqueue(job).await,
            Err(JobQueueError::InvalidJob(_))
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver_closes_queue() {
        let (queue, receiver) = MpscJobQueue::create_pair();
        drop(receiver);

        let result = queue.enqueue(QueryJob::new("hello".to_string())).await;
        assert!(matches!(result, Err(JobQueueError::ConnectionError(_))));
        assert!(!queue.health_check().await.unwrap().is_healthy);
    }

    #[tokio::test]
    async fn test_dropped_sender_ends_receiver() {
        let (queue, receiver) = MpscJobQueue::create_pair();
        queue.enqueue(QueryJob::new("last".to_string())).await.unwrap();
        drop(queue);

        assert!(receiver.recv().await.is_some());
        assert!(receiver.recv().await.is_none());
    }
}
