use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{
    DocumentExtractor, EmbeddingProvider, TextSplitter,
    document_extractor::ExtractedDocument,
    embedding_provider::BatchEmbeddingRequest,
};
use crate::application::services::text_cleanup::clean_text;
use crate::domain::entities::DocumentChunk;
use crate::domain::repositories::{VectorRepository, vector_repository::EmbeddedChunk};

#[derive(Debug)]
pub enum IngestionError {
    ExtractionError(String),
    EmbeddingError(String),
    RepositoryError(String),
    EmptyDocument(String),
}

impl std::fmt::Display for IngestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionError::ExtractionError(msg) => write!(f, "Extraction error: {}", msg),
            IngestionError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            IngestionError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            IngestionError::EmptyDocument(source) => {
                write!(f, "No text could be extracted from {}", source)
            }
        }
    }
}

impl std::error::Error for IngestionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestionMode {
    /// Add to the collection, keeping whatever is already there.
    #[default]
    Append,
    /// Swap out the chunks previously ingested from the same source.
    ReplaceSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestionReport {
    pub source: String,
    pub collection_name: String,
    pub pages: usize,
    pub chunks_created: usize,
    pub embeddings_created: usize,
    pub chunks_replaced: usize,
}

/// Load → clean → split → embed → store, for one PDF into one collection.
pub struct IngestionService {
    document_extractor: Arc<dyn DocumentExtractor>,
    text_splitter: Arc<dyn TextSplitter>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_repository: Arc<dyn VectorRepository>,
    collection_name: String,
    embedding_batch_size: usize,
}

impl IngestionService {
    pub fn new(
        document_extractor: Arc<dyn DocumentExtractor>,
        text_splitter: Arc<dyn TextSplitter>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_repository: Arc<dyn VectorRepository>,
        collection_name: String,
    ) -> Self {
        Self {
            document_extractor,
            text_splitter,
            embedding_provider,
            vector_repository,
            collection_name,
            embedding_batch_size: 10,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.embedding_batch_size = batch_size.max(1);
        self
    }

    pub async fn ingest_file(
        &self,
        file_path: &Path,
        mode: IngestionMode,
    ) -> Result<IngestionReport, IngestionError> {
        tracing::info!(
            "Ingesting {} into collection {}",
            file_path.display(),
            self.collection_name
        );

        let document = self
            .document_extractor
            .extract_pages(file_path)
            .await
            .map_err(|e| IngestionError::ExtractionError(e.to_string()))?;

        self.ingest_document(document, mode).await
    }

    pub async fn ingest_bytes(
        &self,
        data: &[u8],
        source: &str,
        mode: IngestionMode,
    ) -> Result<IngestionReport, IngestionError> {
        let document = self
            .document_extractor
            .extract_pages_from_bytes(data, source)
            .await
            .map_err(|e| IngestionError::ExtractionError(e.to_string()))?;

        self.ingest_document(document, mode).await
    }

    async fn ingest_document(
        &self,
        document: ExtractedDocument,
        mode: IngestionMode,
    ) -> Result<IngestionReport, IngestionError> {
        let chunks = self.create_chunks(&document);
        if chunks.is_empty() {
            return Err(IngestionError::EmptyDocument(document.source.clone()));
        }

        tracing::info!(
            "Split {} pages ({} chars) into {} chunks (size {}, overlap {})",
            document.page_count(),
            document.text_length(),
            chunks.len(),
            self.text_splitter.chunk_size(),
            self.text_splitter.chunk_overlap()
        );

        // Everything is embedded before anything is written, so a failure here
        // leaves the collection untouched.
        let embedded = self.embed_chunks(chunks).await?;
        let embeddings_created = embedded.len();

        let (chunks_replaced, chunks_created) = match mode {
            IngestionMode::Append => {
                let inserted = self
                    .vector_repository
                    .add_documents(&embedded)
                    .await
                    .map_err(|e| IngestionError::RepositoryError(e.to_string()))?;
                (0, inserted)
            }
            IngestionMode::ReplaceSource => self
                .vector_repository
                .replace_source_documents(&self.collection_name, &document.source, &embedded)
                .await
                .map_err(|e| IngestionError::RepositoryError(e.to_string()))?,
        };

        let report = IngestionReport {
            source: document.source,
            collection_name: self.collection_name.clone(),
            pages: document.pages.len(),
            chunks_created,
            embeddings_created,
            chunks_replaced,
        };

        tracing::info!(
            "Stored {} chunks from {} in {} (replaced {})",
            report.chunks_created,
            report.source,
            report.collection_name,
            report.chunks_replaced
        );

        Ok(report)
    }

    /// Chunks are produced page by page so each one keeps its page label.
    pub fn create_chunks(&self, document: &ExtractedDocument) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0;

        for page in &document.pages {
            let cleaned = clean_text(&page.text);

            for chunk_text in self.text_splitter.split_text(&cleaned) {
                if chunk_text.trim().is_empty() {
                    continue;
                }

                chunks.push(DocumentChunk::new(
                    self.collection_name.clone(),
                    chunk_text,
                    page.page_label.clone(),
                    document.source.clone(),
                    chunk_index,
                ));
                chunk_index += 1;
            }
        }

        chunks
    }

    async fn embed_chunks(
        &self,
        chunks: Vec<DocumentChunk>,
    ) -> Result<Vec<EmbeddedChunk>, IngestionError> {
        let mut embedded = Vec::with_capacity(chunks.len());

        for chunk_batch in chunks.chunks(self.embedding_batch_size) {
            let texts: Vec<String> = chunk_batch
                .iter()
                .map(|chunk| chunk.content().to_string())
                .collect();

            let batch_response = self
                .embedding_provider
                .generate_embeddings(BatchEmbeddingRequest { texts })
                .await
                .map_err(|e| IngestionError::EmbeddingError(e.to_string()))?;

            if batch_response.embeddings.len() != chunk_batch.len() {
                return Err(IngestionError::EmbeddingError(format!(
                    "Expected {} embeddings, got {}",
                    chunk_batch.len(),
                    batch_response.embeddings.len()
                )));
            }

            for (chunk, embedding) in chunk_batch.iter().zip(batch_response.embeddings) {
                embedded.push(EmbeddedChunk {
                    chunk: chunk.clone(),
                    embedding,
                });
            }
        }

        Ok(embedded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::document_extractor::ExtractedPage;
    use crate::config::ChunkingConfig;
    use crate::infrastructure::external_services::RecursiveCharacterSplitter;
    use crate::infrastructure::memory::InMemoryVectorRepository;
    use crate::test_support::{
        FailingEmbeddingProvider, FailingExtractor, KeywordEmbeddingProvider, StaticExtractor,
    };

    fn document() -> ExtractedDocument {
        ExtractedDocument {
            source: "docs/nodejs.pdf".to_string(),
            pages: vec![
                ExtractedPage {
                    page_label: "1".to_string(),
                    text: "Contents\nIntroduction.......... 2\nEvent loop.......... 3".to_string(),
                },
                ExtractedPage {
                    page_label: "2".to_string(),
                    text: "Node.js is a JavaScript runtime built on V8.".to_string(),
                },
                ExtractedPage {
                    page_label: "3".to_string(),
                    text: "Node.js uses an event loop to handle asynchronous I/O.\0".to_string(),
                },
            ],
        }
    }

    fn service(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        repository: Arc<InMemoryVectorRepository>,
        chunking: ChunkingConfig,
    ) -> IngestionService {
        IngestionService::new(
            Arc::new(StaticExtractor::new(document())),
            Arc::new(RecursiveCharacterSplitter::new(chunking)),
            embedding_provider,
            repository,
            "rag-agent-1".to_string(),
        )
        .with_batch_size(2)
    }

    #[test]
    fn test_chunks_keep_page_metadata_and_are_cleaned() {
        let repository = Arc::new(InMemoryVectorRepository::new());
        let service = service(
            Arc::new(KeywordEmbeddingProvider::default()),
            repository,
            ChunkingConfig::default(),
        );

        let chunks = service.create_chunks(&document());

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].page_label(), "1");
        assert!(!chunks[0].content().contains("..."));
        assert_eq!(chunks[2].page_label(), "3");
        assert_eq!(chunks[2].source(), "docs/nodejs.pdf");
        assert!(!chunks[2].content().contains('\0'));
        let indexes: Vec<i32> = chunks.iter().map(|c| c.chunk_index()).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn test_small_windows_split_pages_within_bound() {
        let repository = Arc::new(InMemoryVectorRepository::new());
        let chunking = ChunkingConfig::new(20, 5).unwrap();
        let service = service(
            Arc::new(KeywordEmbeddingProvider::default()),
            repository,
            chunking,
        );

        let chunks = service.create_chunks(&document());

        assert!(chunks.len() > 3);
        assert!(chunks.iter().all(|c| c.character_count() <= 20));
        assert!(chunks.iter().any(|c| c.page_label() == "3"));
    }

    #[tokio::test]
    async fn test_ingest_stores_every_chunk() {
        let repository = Arc::new(InMemoryVectorRepository::new());
        let service = service(
            Arc::new(KeywordEmbeddingProvider::default()),
            repository.clone(),
            ChunkingConfig::default(),
        );

        let report = service
            .ingest_file(Path::new("docs/nodejs.pdf"), IngestionMode::Append)
            .await
            .unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(report.chunks_created, 3);
        assert_eq!(report.embeddings_created, 3);
        assert_eq!(report.chunks_replaced, 0);
        assert_eq!(repository.count("rag-agent-1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reingest_duplicates_unless_replacing() {
        let repository = Arc::new(InMemoryVectorRepository::new());
        let service = service(
            Arc::new(KeywordEmbeddingProvider::default()),
            repository.clone(),
            ChunkingConfig::default(),
        );
        let path = Path::new("docs/nodejs.pdf");

        service.ingest_file(path, IngestionMode::Append).await.unwrap();
        service.ingest_file(path, IngestionMode::Append).await.unwrap();
        assert_eq!(repository.count("rag-agent-1").await.unwrap(), 6);

        let report = service
            .ingest_file(path, IngestionMode::ReplaceSource)
            .await
            .unwrap();
        assert_eq!(report.chunks_replaced, 6);
        assert_eq!(repository.count("rag-agent-1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_embedding_failure_persists_nothing() {
        let repository = Arc::new(InMemoryVectorRepository::new());
        let service = service(
            Arc::new(FailingEmbeddingProvider),
            repository.clone(),
            ChunkingConfig::default(),
        );

        let result = service
            .ingest_file(Path::new("docs/nodejs.pdf"), IngestionMode::Append)
            .await;

        assert!(matches!(result, Err(IngestionError::EmbeddingError(_))));
        assert_eq!(repository.count("rag-agent-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_document_is_rejected() {
        let empty = ExtractedDocument {
            source: "blank.pdf".to_string(),
            pages: vec![ExtractedPage {
                page_label: "1".to_string(),
                text: "   ".to_string(),
            }],
        };
        let repository = Arc::new(InMemoryVectorRepository::new());
        let service = IngestionService::new(
            Arc::new(StaticExtractor::new(empty)),
            Arc::new(RecursiveCharacterSplitter::default()),
            Arc::new(KeywordEmbeddingProvider::default()),
            repository,
            "rag-agent-1".to_string(),
        );

        let result = service
            .ingest_file(Path::new("blank.pdf"), IngestionMode::Append)
            .await;

        assert!(matches!(result, Err(IngestionError::EmptyDocument(_))));
    }

    #[tokio::test]
    async fn test_unreadable_page_aborts_the_run() {
        let repository = Arc::new(InMemoryVectorRepository::new());
        let service = IngestionService::new(
            Arc::new(FailingExtractor),
            Arc::new(RecursiveCharacterSplitter::default()),
            Arc::new(KeywordEmbeddingProvider::default()),
            repository.clone(),
            "rag-agent-1".to_string(),
        );

        let result = service
            .ingest_file(Path::new("docs/nodejs.pdf"), IngestionMode::Append)
            .await;

        match result {
            Err(IngestionError::ExtractionError(msg)) => assert!(msg.contains("page 2")),
            other => panic!("expected extraction error, got {:?}", other),
        }
        assert_eq!(repository.count("rag-agent-1").await.unwrap(), 0);
    }
}
