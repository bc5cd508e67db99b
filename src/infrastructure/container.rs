use std::sync::Arc;

use crate::{
    application::{
        ports::{
            ChatCompletionProvider, DocumentExtractor, EmbeddingProvider, JobQueue, TextSplitter,
        },
        services::{IngestionService, QueryProcessorService},
        use_cases::{GetJobStatusUseCase, QueueQueryJobUseCase},
    },
    config::AppConfig,
    domain::repositories::{JobRepository, VectorRepository},
    infrastructure::{
        database::{
            PostgresJobRepository, PostgresVectorRepository, create_connection_pool,
            run_migrations,
        },
        external_services::{
            OllamaEmbeddingProvider, OpenAiChatClient, PdfExtractor, RecursiveCharacterSplitter,
        },
        memory::{InMemoryJobRepository, InMemoryVectorRepository},
        messaging::{BackgroundProcessor, MpscJobQueue},
    },
    presentation::http::handlers::{ChatHandler, HealthHandler},
};

pub struct AppContainer {
    pub config: AppConfig,

    // Repositories
    pub vector_repository: Arc<dyn VectorRepository>,
    pub job_repository: Arc<dyn JobRepository>,

    // External Services
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub chat_provider: Arc<dyn ChatCompletionProvider>,
    pub document_extractor: Arc<dyn DocumentExtractor>,
    pub text_splitter: Arc<dyn TextSplitter>,

    // Job Queue and Background Processing
    pub job_queue: Arc<dyn JobQueue>,
    pub background_processor: Arc<BackgroundProcessor>,

    // Application Services
    pub ingestion_service: Arc<IngestionService>,
    pub query_processor: Arc<QueryProcessorService>,

    // Use Cases
    pub queue_query_use_case: Arc<QueueQueryJobUseCase>,
    pub get_job_status_use_case: Arc<GetJobStatusUseCase>,

    // HTTP Handlers
    pub chat_handler: Arc<ChatHandler>,
    pub health_handler: Arc<HealthHandler>,
}

impl AppContainer {
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let (vector_repository, job_repository): (
            Arc<dyn VectorRepository>,
            Arc<dyn JobRepository>,
        ) = match config.database_url.as_deref() {
            Some(database_url) => {
                let db_pool = create_connection_pool(database_url)?;
                run_migrations(&db_pool)
                    .map_err(|e| format!("Failed to run database migrations: {}", e))?;
                tracing::info!("Using PostgreSQL vector store");

                (
                    Arc::new(PostgresVectorRepository::new(db_pool.clone())),
                    Arc::new(PostgresJobRepository::new(db_pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set, chunks and jobs are kept in memory");
                (
                    Arc::new(InMemoryVectorRepository::new()),
                    Arc::new(InMemoryJobRepository::new()),
                )
            }
        };

        let embedding_provider: Arc<dyn EmbeddingProvider> =
            Arc::new(OllamaEmbeddingProvider::new(&config.embedding)?);

        if config.llm.api_key.is_none() {
            tracing::warn!("No GEMINI_API_KEY or LLM_API_KEY set, queries will fail");
        }
        let chat_provider: Arc<dyn ChatCompletionProvider> =
            Arc::new(OpenAiChatClient::new(&config.llm)?);

        tracing::info!(
            "Embedding model: {}, chat model: {}",
            embedding_provider.model_name(),
            chat_provider.model_name()
        );

        Ok(Self::from_parts(
            config,
            vector_repository,
            job_repository,
            embedding_provider,
            chat_provider,
        ))
    }

    /// Must run before the server accepts work. Jobs left pending by a previous
    /// process were queued in memory that no longer exists.
    pub async fn recover_interrupted_jobs(&self) -> Result<usize, Box<dyn std::error::Error>> {
        self.queue_query_use_case
            .fail_interrupted_jobs()
            .await
            .map_err(|e| format!("Failed to recover interrupted jobs: {}", e).into())
    }

    /// Wires everything above the repositories and the two remote providers.
    pub fn from_parts(
        config: AppConfig,
        vector_repository: Arc<dyn VectorRepository>,
        job_repository: Arc<dyn JobRepository>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        chat_provider: Arc<dyn ChatCompletionProvider>,
    ) -> Self {
        let document_extractor: Arc<dyn DocumentExtractor> = Arc::new(PdfExtractor::new());
        let text_splitter: Arc<dyn TextSplitter> =
            Arc::new(RecursiveCharacterSplitter::new(config.chunking));

        // Create application services
        let ingestion_service = Arc::new(
            IngestionService::new(
                document_extractor.clone(),
                text_splitter.clone(),
                embedding_provider.clone(),
                vector_repository.clone(),
                config.collection_name.clone(),
            )
            .with_batch_size(config.embedding.batch_size),
        );

        let query_processor = Arc::new(
            QueryProcessorService::new(
                embedding_provider.clone(),
                vector_repository.clone(),
                chat_provider.clone(),
                config.collection_name.clone(),
            )
            .with_top_k(config.retrieval_top_k),
        );

        // Create job queue and background processor
        let (job_queue, job_receiver) = MpscJobQueue::create_pair();
        let job_queue: Arc<dyn JobQueue> = Arc::new(job_queue);

        let background_processor = Arc::new(
            BackgroundProcessor::new(
                Arc::new(job_receiver),
                job_repository.clone(),
                query_processor.clone(),
            )
            .with_worker_count(config.worker_count),
        );

        // Create use cases
        let queue_query_use_case = Arc::new(QueueQueryJobUseCase::new(
            job_repository.clone(),
            job_queue.clone(),
        ));
        let get_job_status_use_case = Arc::new(GetJobStatusUseCase::new(job_repository.clone()));

        // Create HTTP handlers
        let chat_handler = Arc::new(ChatHandler::new(
            queue_query_use_case.clone(),
            get_job_status_use_case.clone(),
        ));
        let health_handler = Arc::new(HealthHandler::new(
            job_queue.clone(),
            get_job_status_use_case.clone(),
        ));

        Self {
            config,
            vector_repository,
            job_repository,
            embedding_provider,
            chat_provider,
            document_extractor,
            text_splitter,
            job_queue,
            background_processor,
            ingestion_service,
            query_processor,
            queue_query_use_case,
            get_job_status_use_case,
            chat_handler,
            health_handler,
        }
    }
}
