use std::sync::Arc;

use crate::application::services::QueryProcessorService;
use crate::domain::entities::QueryJob;
use crate::domain::repositories::JobRepository;
use crate::infrastructure::messaging::MpscJobQueueReceiver;

/// Pool of workers that drain the job queue, answer each query and store the
/// outcome on the job record.
pub struct BackgroundProcessor {
    job_receiver: Arc<MpscJobQueueReceiver>,
    job_repository: Arc<dyn JobRepository>,
    query_processor: Arc<QueryProcessorService>,
    worker_count: usize,
}

impl BackgroundProcessor {
    pub fn new(
        job_receiver: Arc<MpscJobQueueReceiver>,
        job_repository: Arc<dyn JobRepository>,
        query_processor: Arc<QueryProcessorService>,
    ) -> Self {
        Self {
            job_receiver,
            job_repository,
            query_processor,
            worker_count: 3,
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Runs until the queue's sending side is dropped and drained.
    pub async fn start(&self) {
        tracing::info!(
            "Starting background processor with {} workers",
            self.worker_count
        );

        let mut handles = Vec::new();

        for worker_id in 0..self.worker_count {
            let processor = self.clone_for_worker();
            let handle = tokio::spawn(async move {
                processor.worker_loop(worker_id).await;
            });
            handles.push(handle);
        }

        for (i, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!("Worker {} panicked: {}", i, e);
            }
        }

        tracing::info!("Background processor stopped");
    }

    async fn worker_loop(&self, worker_id: usize) {
        tracing::debug!("Worker {} started", worker_id);

        while let Some(job) = self.job_receiver.recv().await {
            tracing::info!("Worker {} processing job: {}", worker_id, job.id());
            self.process_job(job).await;
        }

        tracing::debug!("Worker {} stopped", worker_id);
    }

    pub async fn process_job(&self, mut job: QueryJob) {
        let job_id = job.id();
        let start_time = std::time::Instant::now();

        let transition = match self.query_processor.process(job.query()).await {
            Ok(answer) => job.finish(answer),
            Err(error) => {
                tracing::error!("Job {} failed: {}", job_id, error);
                job.fail(error.to_string())
            }
        };

        if let Err(e) = transition {
            tracing::error!("Failed to record outcome of job {}: {}", job_id, e);
            return;
        }

        let turnaround = job
            .duration()
            .map(|d| d.num_milliseconds() as f64 / 1000.0)
            .unwrap_or_default();

        match self.job_repository.complete(&job).await {
            Ok(()) => tracing::info!(
                "Job {} {} in {:.2}s ({:.2}s since queued)",
                job_id,
                job.status(),
                start_time.elapsed().as_secs_f64(),
                turnaround
            ),
            Err(e) => tracing::error!("Failed to store result of job {}: {}", job_id, e),
        }
    }

    fn clone_for_worker(&self) -> Self {
        Self {
            job_receiver: self.job_receiver.clone(),
            job_repository: self.job_repository.clone(),
            query_processor: self.query_processor.clone(),
            worker_count: self.worker_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ChatCompletionProvider, JobQueue};
    use crate::application::services::query_processor::ANSWER_MARKER;
    use crate::domain::entities::DocumentChunk;
    use crate::domain::repositories::VectorRepository;
    use crate::domain::repositories::vector_repository::EmbeddedChunk;
    use crate::infrastructure::memory::{InMemoryJobRepository, InMemoryVectorRepository};
    use crate::infrastructure::messaging::MpscJobQueue;
    use crate::test_support::{EchoChatProvider, FailingChatProvider, KeywordEmbeddingProvider};
    use std::time::Duration;
    use uuid::Uuid;

    async fn processor_with(chat: Arc<dyn ChatCompletionProvider>) -> Arc<QueryProcessorService> {
        let embedder = KeywordEmbeddingProvider::default();
        let repository = Arc::new(InMemoryVectorRepository::new());
        let text = "Node.js uses an event loop";
        repository
            .add_documents(&[EmbeddedChunk {
                chunk: DocumentChunk::new(
                    "rag-agent-1".to_string(),
                    text.to_string(),
                    "3".to_string(),
                    "docs/nodejs.pdf".to_string(),
                    0,
                ),
                embedding: embedder.embed(text),
            }])
            .await
            .unwrap();

        Arc::new(QueryProcessorService::new(
            Arc::new(embedder),
            repository,
            chat,
            "rag-agent-1".to_string(),
        ))
    }

    async fn wait_for_completion(repository: &InMemoryJobRepository, job_id: Uuid) -> QueryJob {
        for _ in 0..200 {
            if let Some(job) = repository.find_by_id(job_id).await.unwrap() {
                if job.status().is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never completed", job_id);
    }

    #[tokio::test]
    async fn test_workers_finish_queued_jobs() {
        let repository = Arc::new(InMemoryJobRepository::new());
        let (queue, receiver) = MpscJobQueue::create_pair();
        let processor = BackgroundProcessor::new(
            Arc::new(receiver),
            repository.clone(),
            processor_with(Arc::new(EchoChatProvider::default())).await,
        )
        .with_worker_count(2);
        let handle = tokio::spawn(async move { processor.start().await });

        let mut ids = Vec::new();
        for _ in 0..5 {
            let job = QueryJob::new("What is the event loop?".to_string());
            repository.save(&job).await.unwrap();
            queue.enqueue(job.clone()).await.unwrap();
            ids.push(job.id());
        }

        for id in ids {
            let job = wait_for_completion(&repository, id).await;
            assert!(job.status().is_finished());
            let answer = job.result().unwrap();
            assert!(answer.starts_with(ANSWER_MARKER));
            assert!(answer.contains("event loop"));
        }

        drop(queue);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_backend_failure_marks_job_failed() {
        let repository = Arc::new(InMemoryJobRepository::new());
        let (_queue, receiver) = MpscJobQueue::create_pair();
        let processor = BackgroundProcessor::new(
            Arc::new(receiver),
            repository.clone(),
            processor_with(Arc::new(FailingChatProvider)).await,
        );

        let job = QueryJob::new("What is the event loop?".to_string());
        repository.save(&job).await.unwrap();
        processor.process_job(job.clone()).await;

        let stored = repository.find_by_id(job.id()).await.unwrap().unwrap();
        assert!(stored.status().is_failed());
        assert!(stored.result().is_none());
        assert!(stored.error_message().unwrap().contains("Completion error"));
    }

    #[tokio::test]
    async fn test_completed_job_is_not_overwritten() {
        let repository = Arc::new(InMemoryJobRepository::new());
        let (_queue, receiver) = MpscJobQueue::create_pair();
        let processor = BackgroundProcessor::new(
            Arc::new(receiver),
            repository.clone(),
            processor_with(Arc::new(FailingChatProvider)).await,
        );

        let mut job = QueryJob::new("hello".to_string());
        repository.save(&job).await.unwrap();
        let pending_copy = job.clone();
        job.finish("🤖: first answer".to_string()).unwrap();
        repository.complete(&job).await.unwrap();

        processor.process_job(pending_copy).await;

        let stored = repository.find_by_id(job.id()).await.unwrap().unwrap();
        assert!(stored.status().is_finished());
        assert_eq!(stored.result(), Some("🤖: first answer"));
    }
}
