use std::sync::Arc;

use crate::application::ports::{
    ChatCompletionProvider, EmbeddingProvider,
    chat_completion::{ChatCompletionRequest, ChatMessage},
    embedding_provider::EmbeddingRequest,
};
use crate::domain::repositories::{VectorRepository, vector_repository::SimilaritySearchResult};

/// Prepended to every answer returned to the user.
pub const ANSWER_MARKER: &str = "🤖: ";

const CONTEXT_SEPARATOR: &str = "\n\n\n";

#[derive(Debug)]
pub enum QueryProcessingError {
    EmbeddingError(String),
    SearchError(String),
    CompletionError(String),
}

impl std::fmt::Display for QueryProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryProcessingError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            QueryProcessingError::SearchError(msg) => write!(f, "Search error: {}", msg),
            QueryProcessingError::CompletionError(msg) => write!(f, "Completion error: {}", msg),
        }
    }
}

impl std::error::Error for QueryProcessingError {}

/// Answers a query from the chunks of one collection.
pub struct QueryProcessorService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_repository: Arc<dyn VectorRepository>,
    chat_provider: Arc<dyn ChatCompletionProvider>,
    collection_name: String,
    top_k: usize,
}

impl QueryProcessorService {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_repository: Arc<dyn VectorRepository>,
        chat_provider: Arc<dyn ChatCompletionProvider>,
        collection_name: String,
    ) -> Self {
        Self {
            embedding_provider,
            vector_repository,
            chat_provider,
            collection_name,
            top_k: 4,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub async fn process(&self, query: &str) -> Result<String, QueryProcessingError> {
        let results = self.retrieve(query).await?;
        let context = build_context(&results);

        tracing::debug!(
            "Retrieved {} chunks ({} chars of context) for query",
            results.len(),
            context.len()
        );

        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage::system(build_system_prompt(&context)),
                ChatMessage::user(query),
            ],
        };

        let response = self
            .chat_provider
            .complete(request)
            .await
            .map_err(|e| QueryProcessingError::CompletionError(e.to_string()))?;

        Ok(format!("{}{}", ANSWER_MARKER, response.content))
    }

    pub async fn retrieve(
        &self,
        query: &str,
    ) -> Result<Vec<SimilaritySearchResult>, QueryProcessingError> {
        let embedding_response = self
            .embedding_provider
            .generate_embedding(EmbeddingRequest {
                text: query.to_string(),
            })
            .await
            .map_err(|e| QueryProcessingError::EmbeddingError(e.to_string()))?;

        self.vector_repository
            .similarity_search(
                &self.collection_name,
                &embedding_response.embedding,
                self.top_k,
            )
            .await
            .map_err(|e| QueryProcessingError::SearchError(e.to_string()))
    }
}

pub fn format_context_block(result: &SimilaritySearchResult) -> String {
    format!(
        "Page Content: {}\nPage Number: {}\nFile Location: {}",
        result.chunk.content(),
        result.chunk.page_label(),
        result.chunk.source()
    )
}

pub fn build_context(results: &[SimilaritySearchResult]) -> String {
    results
        .iter()
        .map(format_context_block)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn build_system_prompt(context: &str) -> String {
    format!(
        "You are a helpful AI Assistant who answers user queries based on the available context \
         retrieved from a PDF file along with page contents and page numbers.\n\n\
         You should only answer the user based on the following context and direct the user to \
         open the right page number to know more.\n\n\
         Context:\n{}",
        context
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::chat_completion::ChatRole;
    use crate::domain::entities::DocumentChunk;
    use crate::domain::repositories::vector_repository::EmbeddedChunk;
    use crate::infrastructure::memory::InMemoryVectorRepository;
    use crate::test_support::{
        EchoChatProvider, FailingChatProvider, FailingEmbeddingProvider, KeywordEmbeddingProvider,
    };

    fn result(content: &str, page: &str) -> SimilaritySearchResult {
        SimilaritySearchResult {
            chunk: DocumentChunk::new(
                "rag-agent-1".to_string(),
                content.to_string(),
                page.to_string(),
                "docs/nodejs.pdf".to_string(),
                0,
            ),
            similarity_score: 0.9,
        }
    }

    async fn seeded_repository(
        embedder: &KeywordEmbeddingProvider,
    ) -> Arc<InMemoryVectorRepository> {
        let repository = Arc::new(InMemoryVectorRepository::new());
        let pages = [
            ("1", "Installing Node.js with a package manager"),
            ("2", "Modules are loaded with require and import"),
            ("3", "Node.js uses an event loop"),
            ("4", "Streams move data in chunks between producers and consumers"),
            ("5", "Buffers hold raw binary data"),
        ];
        let documents: Vec<EmbeddedChunk> = pages
            .iter()
            .enumerate()
            .map(|(i, (page, text))| EmbeddedChunk {
                chunk: DocumentChunk::new(
                    "rag-agent-1".to_string(),
                    text.to_string(),
                    page.to_string(),
                    "docs/nodejs.pdf".to_string(),
                    i as i32,
                ),
                embedding: embedder.embed(text),
            })
            .collect();
        repository.add_documents(&documents).await.unwrap();
        repository
    }

    #[test]
    fn test_context_block_format() {
        let block = format_context_block(&result("Node.js uses an event loop", "3"));

        assert_eq!(
            block,
            "Page Content: Node.js uses an event loop\nPage Number: 3\nFile Location: docs/nodejs.pdf"
        );
    }

    #[test]
    fn test_context_blocks_joined_by_blank_lines() {
        let context = build_context(&[result("first", "1"), result("second", "2")]);

        assert_eq!(context.matches("Page Content:").count(), 2);
        assert!(context.contains("docs/nodejs.pdf\n\n\nPage Content: second"));
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_system_prompt_restricts_to_context() {
        let prompt = build_system_prompt("Page Content: x\nPage Number: 7");

        assert!(prompt.contains("only answer the user based on the following context"));
        assert!(prompt.contains("page number"));
        assert!(prompt.ends_with("Context:\nPage Content: x\nPage Number: 7"));
    }

    #[tokio::test]
    async fn test_process_answers_from_retrieved_page() {
        let embedder = KeywordEmbeddingProvider::default();
        let repository = seeded_repository(&embedder).await;
        let chat = Arc::new(EchoChatProvider::default());
        let processor = QueryProcessorService::new(
            Arc::new(embedder),
            repository,
            chat.clone(),
            "rag-agent-1".to_string(),
        )
        .with_top_k(2);

        let answer = processor.process("What is the event loop?").await.unwrap();

        assert!(answer.starts_with(ANSWER_MARKER));
        assert!(answer.to_lowercase().contains("event loop"));

        let requests = chat.requests();
        assert_eq!(requests.len(), 1);
        let messages = &requests[0].messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("Page Number: 3"));
        assert!(messages[0].content.contains("Node.js uses an event loop"));
        assert_eq!(messages[0].content.matches("Page Content:").count(), 2);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "What is the event loop?");
    }

    #[tokio::test]
    async fn test_retrieve_ranks_matching_page_first() {
        let embedder = KeywordEmbeddingProvider::default();
        let repository = seeded_repository(&embedder).await;
        let processor = QueryProcessorService::new(
            Arc::new(embedder),
            repository,
            Arc::new(EchoChatProvider::default()),
            "rag-agent-1".to_string(),
        );

        let results = processor.retrieve("What is the event loop?").await.unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].chunk.page_label(), "3");
    }

    #[tokio::test]
    async fn test_backend_failures_propagate() {
        let embedder = KeywordEmbeddingProvider::default();
        let repository = seeded_repository(&embedder).await;

        let processor = QueryProcessorService::new(
            Arc::new(FailingEmbeddingProvider),
            repository.clone(),
            Arc::new(EchoChatProvider::default()),
            "rag-agent-1".to_string(),
        );
        assert!(matches!(
            processor.process("hello").await,
            Err(QueryProcessingError::EmbeddingError(_))
        ));

        let processor = QueryProcessorService::new(
            Arc::new(embedder),
            repository,
            Arc::new(FailingChatProvider),
            "rag-agent-1".to_string(),
        );
        assert!(matches!(
            processor.process("hello").await,
            Err(QueryProcessingError::CompletionError(_))
        ));
    }
}
